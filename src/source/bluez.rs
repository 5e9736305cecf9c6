use std::collections::HashMap;
use tracing::debug;
use zbus::Connection;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

use super::{PlayerHandle, PlayerReading, PlayerSource, SourceError, TrackMetadata};

const BLUEZ_SERVICE: &str = "org.bluez";
const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
const MEDIA_PLAYER_INTERFACE: &str = "org.bluez.MediaPlayer1";

type ManagedObjects = HashMap<OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>>;

/// BlueZ `MediaPlayer1` objects on the system bus.
pub struct BluezSource {
    connection: Connection,
}

impl BluezSource {
    pub async fn connect() -> Result<Self, SourceError> {
        let connection = Connection::system().await?;
        Ok(Self { connection })
    }
}

impl PlayerSource for BluezSource {
    async fn discover_player(&self) -> Result<Option<PlayerHandle>, SourceError> {
        let reply = self
            .connection
            .call_method(
                Some(BLUEZ_SERVICE),
                "/",
                Some(OBJECT_MANAGER_INTERFACE),
                "GetManagedObjects",
                &(),
            )
            .await?;
        let objects: ManagedObjects = reply.body().deserialize()?;

        let handle = objects
            .into_iter()
            .find(|(_, interfaces)| interfaces.contains_key(MEDIA_PLAYER_INTERFACE))
            .map(|(path, _)| PlayerHandle::new(path.as_str()));

        if let Some(h) = &handle {
            debug!("Media player found at {}", h.path());
        }
        Ok(handle)
    }

    async fn read_player(&self, handle: &PlayerHandle) -> Result<PlayerReading, SourceError> {
        let reply = self
            .connection
            .call_method(
                Some(BLUEZ_SERVICE),
                handle.path(),
                Some(PROPERTIES_INTERFACE),
                "GetAll",
                &(MEDIA_PLAYER_INTERFACE,),
            )
            .await?;
        let properties: HashMap<String, OwnedValue> = reply.body().deserialize()?;
        parse_reading(properties)
    }
}

fn parse_reading(mut properties: HashMap<String, OwnedValue>) -> Result<PlayerReading, SourceError> {
    let status = match properties.remove("Status") {
        Some(value) => Value::from(value)
            .downcast::<String>()
            .map_err(|e| SourceError::InvalidReply(format!("Status: {e}")))?,
        None => "unknown".to_string(),
    };

    let track = match properties.remove("Track") {
        Some(value) => {
            let fields = Value::from(value)
                .downcast::<HashMap<String, OwnedValue>>()
                .map_err(|e| SourceError::InvalidReply(format!("Track: {e}")))?;
            if fields.is_empty() {
                None
            } else {
                Some(parse_track(fields))
            }
        }
        None => None,
    };

    Ok(PlayerReading { status, track })
}

fn parse_track(mut fields: HashMap<String, OwnedValue>) -> TrackMetadata {
    // Values may arrive wrapped in a variant; downcast unwraps one level.
    let mut text = |key: &str| {
        fields
            .remove(key)
            .and_then(|v| Value::from(v).downcast::<String>().ok())
    };
    let title = text("Title");
    let artist = text("Artist");
    let album = text("Album");
    let duration_ms = fields
        .remove("Duration")
        .and_then(|v| Value::from(v).downcast::<u32>().ok());

    TrackMetadata {
        title,
        artist,
        album,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(value: Value<'_>) -> OwnedValue {
        OwnedValue::try_from(value).unwrap()
    }

    #[test]
    fn test_parse_full_reading() {
        let mut track: HashMap<&str, Value> = HashMap::new();
        track.insert("Title", Value::from("One More Time"));
        track.insert("Artist", Value::from("Daft Punk"));
        track.insert("Album", Value::from("Discovery"));
        track.insert("Duration", Value::from(320_500u32));

        let mut properties = HashMap::new();
        properties.insert("Status".to_string(), owned(Value::from("playing")));
        properties.insert("Track".to_string(), owned(Value::from(track)));
        properties.insert("Position".to_string(), owned(Value::from(1000u32)));

        let reading = parse_reading(properties).unwrap();
        assert_eq!(reading.status, "playing");
        let track = reading.track.unwrap();
        assert_eq!(track.title.as_deref(), Some("One More Time"));
        assert_eq!(track.artist.as_deref(), Some("Daft Punk"));
        assert_eq!(track.album.as_deref(), Some("Discovery"));
        assert_eq!(track.duration_ms, Some(320_500));
    }

    #[test]
    fn test_parse_without_track() {
        let mut properties = HashMap::new();
        properties.insert("Status".to_string(), owned(Value::from("paused")));
        let reading = parse_reading(properties).unwrap();
        assert_eq!(reading.status, "paused");
        assert_eq!(reading.track, None);

        let empty: HashMap<&str, Value> = HashMap::new();
        let mut properties = HashMap::new();
        properties.insert("Track".to_string(), owned(Value::from(empty)));
        let reading = parse_reading(properties).unwrap();
        assert_eq!(reading.status, "unknown");
        assert_eq!(reading.track, None);
    }

    #[test]
    fn test_parse_rejects_wrong_status_type() {
        let mut properties = HashMap::new();
        properties.insert("Status".to_string(), owned(Value::from(7u32)));
        assert!(matches!(
            parse_reading(properties),
            Err(SourceError::InvalidReply(_))
        ));
    }
}
