use crate::errors::DomainError;
use crate::value_objects::{RoomId, Timestamp, UserId};

pub const MAX_ROOM_NAME_CHARS: usize = 100;
pub const MAX_ROOM_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatRoom {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ChatRoom {
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        description: impl Into<String>,
        created_by: UserId,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(name.into())?;
        let description = Self::validate_description(description.into())?;
        Ok(Self {
            id,
            name,
            description,
            created_by,
            created_at,
            updated_at: created_at,
        })
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_argument("name", "room name is required"));
        }
        if trimmed.chars().count() > MAX_ROOM_NAME_CHARS {
            return Err(DomainError::invalid_argument(
                "name",
                format!("exceeds {MAX_ROOM_NAME_CHARS} characters"),
            ));
        }
        Ok(trimmed.to_owned())
    }

    fn validate_description(description: String) -> Result<String, DomainError> {
        if description.chars().count() > MAX_ROOM_DESCRIPTION_CHARS {
            return Err(DomainError::invalid_argument(
                "description",
                format!("exceeds {MAX_ROOM_DESCRIPTION_CHARS} characters"),
            ));
        }
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn room(name: &str, description: &str) -> Result<ChatRoom, DomainError> {
        ChatRoom::new(
            RoomId::from(Uuid::new_v4()),
            name,
            description,
            UserId::from(Uuid::new_v4()),
            Utc::now(),
        )
    }

    #[test]
    fn new_room_starts_with_equal_timestamps() {
        let room = room("general", "").unwrap();
        assert_eq!(room.created_at, room.updated_at);
        assert_eq!(room.name, "general");
    }

    #[test]
    fn name_must_be_present_and_bounded() {
        assert_eq!(room("", "").unwrap_err().field(), "name");
        assert_eq!(room("  ", "").unwrap_err().field(), "name");
        assert!(room(&"n".repeat(100), "").is_ok());
        assert!(room(&"n".repeat(101), "").is_err());
    }

    #[test]
    fn description_is_bounded() {
        assert!(room("general", &"d".repeat(500)).is_ok());
        assert_eq!(
            room("general", &"d".repeat(501)).unwrap_err().field(),
            "description"
        );
    }
}
