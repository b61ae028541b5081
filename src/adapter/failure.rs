use serde::Deserialize;
use snafu::Snafu;

/// The failure reported by an adapter.
///
/// Adapters either report a plain message, or forward a platform error
/// object that carries its message in a `fail` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FailurePayload {
    /// A plain message.
    Message(String),
    /// A platform error object.
    Wrapped {
        /// The message.
        fail: String,
    },
}

impl FailurePayload {
    /// Returns the message, unwrapping platform error objects.
    #[must_use]
    pub fn into_message(self) -> String {
        match self {
            Self::Message(message) | Self::Wrapped { fail: message } => message,
        }
    }
}

impl From<String> for FailurePayload {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for FailurePayload {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

impl TryFrom<serde_json::Value> for FailurePayload {
    type Error = UnrecognizedFailure;

    fn try_from(payload: serde_json::Value) -> Result<Self, Self::Error> {
        match FailurePayload::deserialize(&payload) {
            Ok(failure) => Ok(failure),
            Err(_) => UnrecognizedFailureSnafu { payload }.fail(),
        }
    }
}

/// A failure payload that is neither a string nor an object with a string `fail` field.
#[derive(Debug, Snafu)]
#[snafu(display("unrecognized adapter failure payload: {payload}"))]
pub struct UnrecognizedFailure {
    payload: serde_json::Value,
}

impl UnrecognizedFailure {
    /// The payload as received.
    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

impl crate::Error for UnrecognizedFailure {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_plain_message() {
        let failure = FailurePayload::try_from(json!("request:fail timeout")).unwrap();
        assert_eq!(failure, FailurePayload::Message("request:fail timeout".into()));
        assert_eq!(failure.into_message(), "request:fail timeout");
    }

    #[test]
    fn test_wrapped_message() {
        let failure =
            FailurePayload::try_from(json!({ "fail": "X", "errno": 600001 })).unwrap();
        assert_eq!(failure, FailurePayload::Wrapped { fail: "X".into() });
        assert_eq!(failure.into_message(), "X");
    }

    #[test]
    fn test_unrecognized_shapes_rejected() {
        for payload in [json!(42), json!(null), json!({ "fail": 3 }), json!({ "msg": "x" })] {
            let err = FailurePayload::try_from(payload.clone()).unwrap_err();
            assert_eq!(err.payload(), &payload);
            assert!(err.to_string().starts_with("unrecognized adapter failure payload"));
        }
    }
}
