use crate::protocol::RtmpCommand;

/// Status notification surfaced to the application
/// (NetConnection/NetStream status info objects)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub code: String,
    pub level: String,
    pub description: String,
}

impl StatusEvent {
    pub fn new(
        code: impl Into<String>,
        level: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        StatusEvent {
            code: code.into(),
            level: level.into(),
            description: description.into(),
        }
    }

    /// Extract the info object of a `_result`/`_error`/`onStatus`
    /// command
    pub fn from_command(command: &RtmpCommand) -> Option<Self> {
        let info = command.info_object()?;
        let code = info.get_property("code")?.as_str()?.to_string();
        let level = info
            .get_property("level")
            .and_then(|v| v.as_str())
            .unwrap_or("status")
            .to_string();
        let description = info
            .get_property("description")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Some(StatusEvent {
            code,
            level,
            description,
        })
    }

    pub fn is_error(&self) -> bool {
        self.level == "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CODE_CONNECT_SUCCESS, LEVEL_STATUS};

    #[test]
    fn test_from_on_status_command() {
        let command =
            RtmpCommand::on_status(LEVEL_STATUS, CODE_CONNECT_SUCCESS, "Connection succeeded.");
        let event = StatusEvent::from_command(&command).unwrap();
        assert_eq!(event.code, CODE_CONNECT_SUCCESS);
        assert_eq!(event.level, LEVEL_STATUS);
        assert!(!event.is_error());
    }

    #[test]
    fn test_command_without_info_yields_none() {
        assert!(StatusEvent::from_command(&RtmpCommand::create_stream(1.0)).is_none());
    }
}
