use serde::{Deserialize, Serialize};

/// Precedes every body on the wire, in both directions.
///
/// Requests carry `service_method` and a client-chosen `seq`; responses echo
/// both and put a failure description in `error` (empty on success).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// `"Service.Method"`.
    pub service_method: String,
    /// Sequence number chosen by the client.
    pub seq: u64,
    #[serde(default)]
    pub error: String,
}

impl Header {
    /// A request header.
    pub fn request(service_method: impl Into<String>, seq: u64) -> Self {
        Self {
            service_method: service_method.into(),
            seq,
            error: String::new(),
        }
    }

    /// Whether the peer reported a failure for this exchange.
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_field_names_are_camel_case() {
        let header = Header::request("Foo.Sum", 7);
        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(json, r#"{"serviceMethod":"Foo.Sum","seq":7,"error":""}"#);
    }

    #[test]
    fn missing_error_field_defaults_to_empty() {
        let header: Header = serde_json::from_str(r#"{"serviceMethod":"A.B","seq":1}"#).unwrap();
        assert!(!header.is_error());
        assert_eq!(header.seq, 1);
    }
}
