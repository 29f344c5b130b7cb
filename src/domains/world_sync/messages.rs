use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Login {
    pub nickname: String,
}

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClientMessage {
    Login(Login),
}

impl ClientMessage {
    pub fn login(nickname: impl Into<String>) -> Self {
        ClientMessage::Login(Login {
            nickname: nickname.into(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_uses_external_tagging() {
        let bytes = ClientMessage::login("killer").to_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"Login":{"nickname":"killer"}}"#
        );
    }
}
