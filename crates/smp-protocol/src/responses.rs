//! Responses from the device.

use ciborium::value::Value;

use crate::constants::*;
use crate::error::*;
use crate::frame::Frame;
use crate::types::Group;
use crate::value::{as_bool, as_bytes, as_text, as_u64, map_get};

/// Typed view of a response frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Generic success with no payload of interest.
    Ok,

    /// Device reported a non-zero return code.
    Error(ReturnCode),

    /// Echo reply.
    Echo {
        /// Echoed text.
        text: String,
    },

    /// Image slot listing.
    ImageState(ImageStateResponse),

    /// Upload acknowledgement.
    UploadAck {
        /// Next offset the device expects.
        off: u64,
    },

    /// Any other response body.
    Other(Value),
}

impl Response {
    /// Decode a response frame.
    pub fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        if let Some(code) = frame.return_code() {
            if !code.is_ok() {
                return Ok(Response::Error(code));
            }
        }

        let body = match &frame.body {
            Some(body) => body,
            None => return Ok(Response::Ok),
        };

        match (frame.group, frame.command_id) {
            (Group::Os, OS_ECHO) => {
                let text = map_get(body, KEY_ECHO_REPLY)
                    .and_then(as_text)
                    .ok_or_else(|| ProtocolError::InvalidData("echo reply without 'r'".into()))?;
                Ok(Response::Echo {
                    text: text.to_string(),
                })
            }
            (Group::Image, IMAGE_STATE) => Ok(Response::ImageState(ImageStateResponse::decode(body)?)),
            (Group::Image, IMAGE_UPLOAD) => {
                let off = map_get(body, KEY_OFF)
                    .and_then(as_u64)
                    .ok_or_else(|| ProtocolError::InvalidData("upload ack without 'off'".into()))?;
                Ok(Response::UploadAck { off })
            }
            _ => match body {
                Value::Map(entries) if entries.iter().all(|(k, _)| is_rc_key(k)) => Ok(Response::Ok),
                other => Ok(Response::Other(other.clone())),
            },
        }
    }
}

fn is_rc_key(key: &Value) -> bool {
    matches!(key, Value::Text(k) if k == KEY_RC)
}

/// Offset carried by an upload acknowledgement.
///
/// Matches frames of the image upload command whose return code is absent
/// or an unsigned zero and whose body has an `off` field. Any other `rc`,
/// including a negative or non-integer one, is a failure.
pub fn upload_ack_offset(frame: &Frame) -> Option<u64> {
    if !frame.is_command(Group::Image, IMAGE_UPLOAD) {
        return None;
    }
    match frame.return_code() {
        None | Some(ReturnCode::Ok) => {}
        Some(_) => return None,
    }
    frame.get(KEY_OFF).and_then(as_u64)
}

/// Image state listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageStateResponse {
    /// One entry per slot.
    pub images: Vec<ImageSlot>,
    /// Split image status, if reported.
    pub split_status: Option<u64>,
}

impl ImageStateResponse {
    fn decode(body: &Value) -> Result<Self, ProtocolError> {
        let images = match map_get(body, KEY_IMAGES) {
            Some(Value::Array(items)) => items
                .iter()
                .map(ImageSlot::decode)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(ProtocolError::InvalidData("'images' is not an array".into())),
            None => Vec::new(),
        };

        Ok(ImageStateResponse {
            images,
            split_status: map_get(body, KEY_SPLIT_STATUS).and_then(as_u64),
        })
    }

    /// The slot currently running, if any.
    pub fn active(&self) -> Option<&ImageSlot> {
        self.images.iter().find(|slot| slot.active)
    }

    /// Find a slot by image hash.
    pub fn find_by_hash(&self, hash: &[u8]) -> Option<&ImageSlot> {
        self.images.iter().find(|slot| slot.hash == hash)
    }
}

/// State of one image slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageSlot {
    /// Image number on multi-image devices.
    pub image: Option<u64>,
    /// Slot index.
    pub slot: u64,
    /// Version string.
    pub version: String,
    /// Image hash.
    pub hash: Vec<u8>,
    /// Slot holds a bootable image.
    pub bootable: bool,
    /// Image will be swapped in on next reset.
    pub pending: bool,
    /// Image is confirmed.
    pub confirmed: bool,
    /// Image is running.
    pub active: bool,
    /// Pending swap is permanent.
    pub permanent: bool,
}

impl ImageSlot {
    fn decode(item: &Value) -> Result<Self, ProtocolError> {
        let slot = map_get(item, "slot")
            .and_then(as_u64)
            .ok_or_else(|| ProtocolError::InvalidData("image entry without 'slot'".into()))?;
        let flag = |key: &str| map_get(item, key).and_then(as_bool).unwrap_or(false);

        Ok(ImageSlot {
            image: map_get(item, KEY_IMAGE).and_then(as_u64),
            slot,
            version: map_get(item, "version")
                .and_then(as_text)
                .unwrap_or_default()
                .to_string(),
            hash: map_get(item, KEY_HASH)
                .and_then(as_bytes)
                .unwrap_or_default()
                .to_vec(),
            bootable: flag("bootable"),
            pending: flag("pending"),
            confirmed: flag("confirmed"),
            active: flag("active"),
            permanent: flag("permanent"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operation;
    use crate::value::{text_map, uint};

    fn response(group: Group, command_id: u8, body: Option<Value>) -> Frame {
        let bytes = Frame::encode(Operation::WriteResponse, group, command_id, 0, body.as_ref())
            .unwrap();
        Frame::decode(&bytes).unwrap()
    }

    #[test]
    fn test_upload_ack_predicate() {
        let ack = response(
            Group::Image,
            IMAGE_UPLOAD,
            Some(text_map([("rc", uint(0)), ("off", uint(200))])),
        );
        assert_eq!(upload_ack_offset(&ack), Some(200));

        let no_rc = response(Group::Image, IMAGE_UPLOAD, Some(text_map([("off", uint(8))])));
        assert_eq!(upload_ack_offset(&no_rc), Some(8));

        let failed = response(
            Group::Image,
            IMAGE_UPLOAD,
            Some(text_map([("rc", uint(2)), ("off", uint(200))])),
        );
        assert_eq!(upload_ack_offset(&failed), None);

        let missing_off = response(Group::Image, IMAGE_UPLOAD, Some(text_map([("rc", uint(0))])));
        assert_eq!(upload_ack_offset(&missing_off), None);

        let other = response(Group::Image, IMAGE_STATE, Some(text_map([("off", uint(1))])));
        assert_eq!(upload_ack_offset(&other), None);
    }

    #[test]
    fn test_upload_ack_rejects_malformed_rc() {
        let negative = response(
            Group::Image,
            IMAGE_UPLOAD,
            Some(text_map([
                ("rc", Value::Integer((-1).into())),
                ("off", uint(60)),
            ])),
        );
        assert_eq!(upload_ack_offset(&negative), None);
        assert_eq!(
            Response::decode(&negative).unwrap(),
            Response::Error(ReturnCode::Unknown)
        );

        let text = response(
            Group::Image,
            IMAGE_UPLOAD,
            Some(text_map([("rc", Value::Text("ok".into())), ("off", uint(60))])),
        );
        assert_eq!(upload_ack_offset(&text), None);
        assert_eq!(
            Response::decode(&text).unwrap(),
            Response::Error(ReturnCode::Unknown)
        );
    }

    #[test]
    fn test_decode_error_code() {
        let frame = response(Group::Os, OS_RESET, Some(text_map([("rc", uint(6))])));
        assert_eq!(
            Response::decode(&frame).unwrap(),
            Response::Error(ReturnCode::BadState)
        );
    }

    #[test]
    fn test_decode_ok_variants() {
        let frame = response(Group::Os, OS_RESET, None);
        assert_eq!(Response::decode(&frame).unwrap(), Response::Ok);

        let frame = response(Group::Image, IMAGE_ERASE, Some(text_map([("rc", uint(0))])));
        assert_eq!(Response::decode(&frame).unwrap(), Response::Ok);
    }

    #[test]
    fn test_decode_echo() {
        let frame = response(
            Group::Os,
            OS_ECHO,
            Some(text_map([("r", Value::Text("hello".into()))])),
        );
        assert_eq!(
            Response::decode(&frame).unwrap(),
            Response::Echo {
                text: "hello".into()
            }
        );
    }

    #[test]
    fn test_decode_image_state() {
        let slot0 = text_map([
            ("slot", uint(0)),
            ("version", Value::Text("1.0.0".into())),
            ("hash", Value::Bytes(vec![1; 32])),
            ("bootable", Value::Bool(true)),
            ("confirmed", Value::Bool(true)),
            ("active", Value::Bool(true)),
        ]);
        let slot1 = text_map([
            ("slot", uint(1)),
            ("version", Value::Text("1.1.0".into())),
            ("hash", Value::Bytes(vec![2; 32])),
            ("pending", Value::Bool(true)),
        ]);
        let body = text_map([
            ("images", Value::Array(vec![slot0, slot1])),
            ("splitStatus", uint(0)),
        ]);
        let frame = response(Group::Image, IMAGE_STATE, Some(body));

        let state = match Response::decode(&frame).unwrap() {
            Response::ImageState(state) => state,
            other => panic!("unexpected response: {:?}", other),
        };
        assert_eq!(state.images.len(), 2);
        assert_eq!(state.split_status, Some(0));
        assert_eq!(state.active().map(|s| s.slot), Some(0));
        let pending = state.find_by_hash(&[2; 32]).unwrap();
        assert!(pending.pending);
        assert!(!pending.confirmed);
        assert_eq!(pending.version, "1.1.0");
    }

    #[test]
    fn test_decode_image_state_missing_slot() {
        let body = text_map([("images", Value::Array(vec![text_map([("active", Value::Bool(true))])]))]);
        let frame = response(Group::Image, IMAGE_STATE, Some(body));
        assert!(matches!(
            Response::decode(&frame),
            Err(ProtocolError::InvalidData(_))
        ));
    }

    #[test]
    fn test_decode_other() {
        let body = text_map([("tasks", Value::Map(vec![]))]);
        let frame = response(Group::Os, OS_TASK_STATS, Some(body.clone()));
        assert_eq!(Response::decode(&frame).unwrap(), Response::Other(body));
    }
}
