use crate::config::PushType;
use crate::models::{Envelope, FcmData, FcmMessage, FcmNotification, MessagePayload, NotificationTarget};

/// Assemble the envelope for `target`, attaching the payload blocks `push_type` calls for.
pub fn build_envelope(
    target: NotificationTarget,
    payload: &MessagePayload,
    push_type: PushType,
) -> Envelope {
    let notification = push_type.includes_notification().then(|| FcmNotification {
        title: payload.title.clone(),
        body: payload.body.clone(),
    });

    let data = push_type.includes_data().then(|| FcmData {
        title: payload.title.clone(),
        description: payload.body.clone(),
        image: payload.image.clone(),
        payload: payload.data.clone(),
    });

    Envelope {
        message: FcmMessage {
            target,
            notification,
            data,
        },
    }
}

/// Envelope builder bound to one push type
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageBuilder {
    push_type: PushType,
}

impl MessageBuilder {
    pub fn new(push_type: PushType) -> Self {
        Self { push_type }
    }

    pub fn push_type(&self) -> PushType {
        self.push_type
    }

    pub fn build(&self, target: NotificationTarget, payload: &MessagePayload) -> Envelope {
        build_envelope(target, payload, self.push_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn block_keys(envelope: &Envelope) -> Vec<String> {
        let value = serde_json::to_value(envelope).unwrap();
        let mut keys: Vec<String> = value["message"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_blocks_per_push_type() {
        let payload = MessagePayload::new("Hi", "World");
        let target = || NotificationTarget::SingleToken("tok".to_string());

        let cases = [
            (PushType::Notification, vec!["notification", "token"]),
            (PushType::Data, vec!["data", "token"]),
            (PushType::Both, vec!["data", "notification", "token"]),
        ];

        for (push_type, expected) in cases {
            let envelope = build_envelope(target(), &payload, push_type);
            assert_eq!(block_keys(&envelope), expected, "{push_type}");
        }
    }

    #[test]
    fn test_both_to_single_token() {
        let envelope = MessageBuilder::new(PushType::Both).build(
            NotificationTarget::SingleToken("tok123".to_string()),
            &MessagePayload::new("Hi", "World"),
        );

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "message": {
                    "token": "tok123",
                    "notification": {"title": "Hi", "body": "World"},
                    "data": {"title": "Hi", "description": "World", "image": "", "payload": null}
                }
            })
        );
    }

    #[test]
    fn test_global_topic_target() {
        let envelope = build_envelope(
            NotificationTarget::global(),
            &MessagePayload::new("T", "M"),
            PushType::Notification,
        );

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"message": {"topic": "global", "notification": {"title": "T", "body": "M"}}})
        );
    }

    #[test]
    fn test_data_block_carries_image_and_payload() {
        let mut data = Map::new();
        data.insert("deep_link".to_string(), json!("nova://post/7"));
        data.insert("badge".to_string(), json!(3));

        let payload = MessagePayload::new("New comment", "Alice replied")
            .with_image("https://cdn.nova.dev/avatar.png")
            .with_data(data);

        let envelope = build_envelope(
            NotificationTarget::MultiToken(vec!["a".to_string(), "b".to_string()]),
            &payload,
            PushType::Data,
        );

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "message": {
                    "tokens": ["a", "b"],
                    "data": {
                        "title": "New comment",
                        "description": "Alice replied",
                        "image": "https://cdn.nova.dev/avatar.png",
                        "payload": {"deep_link": "nova://post/7", "badge": 3}
                    }
                }
            })
        );
    }

    #[test]
    fn test_builder_default_is_both() {
        assert_eq!(MessageBuilder::default().push_type(), PushType::Both);
    }
}
