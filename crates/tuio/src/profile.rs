//! TUIO 1.1 profiles and message decoding.
//!
//! A TUIO message is an OSC message whose address names the profile
//! (`/tuio/2Dcur`, ...) and whose first argument is the message type keyword:
//! `source`, `alive`, `set` or `fseq`. The remaining arguments are positional.

use crate::atom::OscAtom;
use crate::bundle::OscMessage;
use crate::error::DecodeError;
use serde::Serialize;

/// Profile addresses recognized by TUIO 1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Profile {
    Cursor2D,
    Object2D,
    Blob2D,
    Cursor25D,
    Object25D,
    Blob25D,
    Cursor3D,
    Object3D,
    Blob3D,
}

impl Profile {
    pub const ALL: [Profile; 9] = [
        Profile::Cursor2D,
        Profile::Object2D,
        Profile::Blob2D,
        Profile::Cursor25D,
        Profile::Object25D,
        Profile::Blob25D,
        Profile::Cursor3D,
        Profile::Object3D,
        Profile::Blob3D,
    ];

    pub fn from_address(address: &str) -> Option<Profile> {
        Profile::ALL.into_iter().find(|p| p.address() == address)
    }

    pub fn address(self) -> &'static str {
        match self {
            Profile::Cursor2D => "/tuio/2Dcur",
            Profile::Object2D => "/tuio/2Dobj",
            Profile::Blob2D => "/tuio/2Dblb",
            Profile::Cursor25D => "/tuio/25Dcur",
            Profile::Object25D => "/tuio/25Dobj",
            Profile::Blob25D => "/tuio/25Dblb",
            Profile::Cursor3D => "/tuio/3Dcur",
            Profile::Object3D => "/tuio/3Dobj",
            Profile::Blob3D => "/tuio/3Dblb",
        }
    }

    pub fn entity_kind(self) -> EntityKind {
        match self {
            Profile::Cursor2D | Profile::Cursor25D | Profile::Cursor3D => EntityKind::Cursor,
            Profile::Object2D | Profile::Object25D | Profile::Object3D => EntityKind::Object,
            Profile::Blob2D | Profile::Blob25D | Profile::Blob3D => EntityKind::Blob,
        }
    }

    /// Whether `set` messages of this profile can be decoded (2D only).
    pub fn is_implemented(self) -> bool {
        matches!(self, Profile::Cursor2D | Profile::Object2D | Profile::Blob2D)
    }
}

/// What a profile tracks, independent of dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Cursor,
    Object,
    Blob,
}

/// `set` fields of a 2D cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor2D {
    pub session_id: i32,
    pub x_position: f32,
    pub y_position: f32,
    pub x_velocity: f32,
    pub y_velocity: f32,
    pub motion_acceleration: f32,
}

/// `set` fields of a 2D tagged object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Object2D {
    pub session_id: i32,
    pub class_id: i32,
    pub x_position: f32,
    pub y_position: f32,
    pub a_angle: f32,
    pub x_velocity: f32,
    pub y_velocity: f32,
    pub a_rotation_speed: f32,
    pub motion_acceleration: f32,
    pub rotation_acceleration: f32,
}

/// `set` fields of a 2D blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob2D {
    pub session_id: i32,
    pub x_position: f32,
    pub y_position: f32,
    pub a_angle: f32,
    pub width: f32,
    pub height: f32,
    pub area: f32,
    pub x_velocity: f32,
    pub y_velocity: f32,
    pub a_rotation_speed: f32,
    pub motion_acceleration: f32,
    pub rotation_acceleration: f32,
}

/// Decoded `set` payload, one variant per implemented profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SetFields {
    Cursor2D(Cursor2D),
    Object2D(Object2D),
    Blob2D(Blob2D),
}

impl SetFields {
    pub fn session_id(&self) -> i32 {
        match self {
            SetFields::Cursor2D(c) => c.session_id,
            SetFields::Object2D(o) => o.session_id,
            SetFields::Blob2D(b) => b.session_id,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            SetFields::Cursor2D(_) => EntityKind::Cursor,
            SetFields::Object2D(_) => EntityKind::Object,
            SetFields::Blob2D(_) => EntityKind::Blob,
        }
    }
}

/// Message type keyword plus its decoded fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Source {
        address: String,
    },
    Alive {
        #[serde(rename = "sessionIds")]
        session_ids: Vec<i32>,
    },
    Set(SetFields),
    Fseq {
        #[serde(rename = "frameId")]
        frame_id: i32,
    },
}

impl MessageBody {
    pub fn keyword(&self) -> &'static str {
        match self {
            MessageBody::Source { .. } => "source",
            MessageBody::Alive { .. } => "alive",
            MessageBody::Set(_) => "set",
            MessageBody::Fseq { .. } => "fseq",
        }
    }
}

/// Frame id that marks a bundle as a retransmission of an earlier frame.
pub const DUPLICATE_FRAME_ID: i32 = -1;

/// One decoded TUIO message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuioMessage {
    /// Profile address exactly as received.
    pub profile: String,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl TuioMessage {
    /// Parsed profile, or `None` for an address outside TUIO 1.1.
    pub fn profile(&self) -> Option<Profile> {
        Profile::from_address(&self.profile)
    }

    pub fn is_duplicate_marker(&self) -> bool {
        matches!(self.body, MessageBody::Fseq { frame_id } if frame_id == DUPLICATE_FRAME_ID)
    }
}

/// Decodes a TUIO message from an OSC message.
///
/// `alive` and `fseq` decode the same way for every profile address. `source`
/// needs a recognized profile and `set` an implemented one; anything else is
/// [DecodeError::UnknownProfile].
pub fn decode_message(message: &OscMessage) -> Result<TuioMessage, DecodeError> {
    let keyword = match message.args.first() {
        Some(atom) => atom
            .as_str()
            .ok_or(DecodeError::WrongArgumentType {
                index: 0,
                expected: "string",
            })?,
        None => return Err(DecodeError::MissingHeader),
    };
    let fields = Fields::new(&message.args[1..]);
    let body = match keyword {
        "source" => {
            Profile::from_address(&message.address)
                .ok_or_else(|| DecodeError::UnknownProfile(message.address.clone()))?;
            MessageBody::Source {
                address: fields.string(0)?,
            }
        }
        "alive" => MessageBody::Alive {
            session_ids: fields.session_ids()?,
        },
        "set" => MessageBody::Set(decode_set(&message.address, &fields)?),
        "fseq" => MessageBody::Fseq {
            frame_id: fields.int(0)?,
        },
        other => return Err(DecodeError::UnknownMessageKind(other.to_string())),
    };
    Ok(TuioMessage {
        profile: message.address.clone(),
        body,
    })
}

fn decode_set(address: &str, f: &Fields<'_>) -> Result<SetFields, DecodeError> {
    let profile = Profile::from_address(address)
        .filter(|p| p.is_implemented())
        .ok_or_else(|| DecodeError::UnknownProfile(address.to_string()))?;
    let fields = match profile {
        Profile::Cursor2D => SetFields::Cursor2D(Cursor2D {
            session_id: f.session_id(0)?,
            x_position: f.float(1)?,
            y_position: f.float(2)?,
            x_velocity: f.float(3)?,
            y_velocity: f.float(4)?,
            motion_acceleration: f.float(5)?,
        }),
        Profile::Object2D => SetFields::Object2D(Object2D {
            session_id: f.session_id(0)?,
            class_id: f.int(1)?,
            x_position: f.float(2)?,
            y_position: f.float(3)?,
            a_angle: f.float(4)?,
            x_velocity: f.float(5)?,
            y_velocity: f.float(6)?,
            a_rotation_speed: f.float(7)?,
            motion_acceleration: f.float(8)?,
            rotation_acceleration: f.float(9)?,
        }),
        Profile::Blob2D => SetFields::Blob2D(Blob2D {
            session_id: f.session_id(0)?,
            x_position: f.float(1)?,
            y_position: f.float(2)?,
            a_angle: f.float(3)?,
            width: f.float(4)?,
            height: f.float(5)?,
            area: f.float(6)?,
            x_velocity: f.float(7)?,
            y_velocity: f.float(8)?,
            a_rotation_speed: f.float(9)?,
            motion_acceleration: f.float(10)?,
            rotation_acceleration: f.float(11)?,
        }),
        reserved => return Err(DecodeError::UnknownProfile(reserved.address().to_string())),
    };
    Ok(fields)
}

/// Positional arguments following the type keyword. Indices reported in errors
/// are OSC argument indices (the keyword is argument 0).
struct Fields<'a> {
    args: &'a [OscAtom],
}

impl<'a> Fields<'a> {
    fn new(args: &'a [OscAtom]) -> Self {
        Self { args }
    }

    fn required(&self, i: usize, expected: &'static str) -> Result<&'a OscAtom, DecodeError> {
        self.args.get(i).ok_or(DecodeError::MissingArgument {
            index: i + 1,
            expected,
        })
    }

    fn string(&self, i: usize) -> Result<String, DecodeError> {
        let atom = self.required(i, "string")?;
        atom.as_str().map(str::to_string).ok_or(DecodeError::WrongArgumentType {
            index: i + 1,
            expected: "string",
        })
    }

    fn int(&self, i: usize) -> Result<i32, DecodeError> {
        self.required(i, "int32")?
            .to_i32()
            .ok_or(DecodeError::WrongArgumentType {
                index: i + 1,
                expected: "int32",
            })
    }

    fn session_id(&self, i: usize) -> Result<i32, DecodeError> {
        self.required(i, "session id")?
            .to_session_id()
            .ok_or(DecodeError::WrongArgumentType {
                index: i + 1,
                expected: "session id",
            })
    }

    /// Trailing numeric fields are optional; an absent one reads as 0.0.
    fn float(&self, i: usize) -> Result<f32, DecodeError> {
        match self.args.get(i) {
            None => Ok(0.0),
            Some(atom) => atom.to_f32().ok_or(DecodeError::WrongArgumentType {
                index: i + 1,
                expected: "float32",
            }),
        }
    }

    fn session_ids(&self) -> Result<Vec<i32>, DecodeError> {
        (0..self.args.len()).map(|i| self.session_id(i)).collect()
    }
}
