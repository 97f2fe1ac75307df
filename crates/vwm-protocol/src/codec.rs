//! Plan-driven argument decoding and event encoding.

use std::collections::VecDeque;
use std::os::fd::{AsRawFd, OwnedFd};

use crate::errors::WireError;
use crate::id::ObjectId;
use crate::kind::{ArgKind, ArgSpec};
use crate::layout::{Segment, SlotPart, VariableKind};
use crate::registry::CompiledMessage;
use crate::wire::{
    Fixed, HEADER_SIZE, MessageHeader, PayloadCursor, marshalled_array_size,
    marshalled_string_size, round_up4,
};

/// A decoded argument, or one supplied for encoding.
#[derive(Debug)]
pub enum ArgValue {
    Uint(u32),
    Int(i32),
    Fixed(Fixed),
    Object(Option<ObjectId>),
    NewId(ObjectId),
    GenericNewId {
        interface: String,
        version: u32,
        id: ObjectId,
    },
    String(Option<String>),
    Array(Vec<u8>),
    Fd(OwnedFd),
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Uint(left), Self::Uint(right)) => left == right,
            (Self::Int(left), Self::Int(right)) => left == right,
            (Self::Fixed(left), Self::Fixed(right)) => left == right,
            (Self::Object(left), Self::Object(right)) => left == right,
            (Self::NewId(left), Self::NewId(right)) => left == right,
            (
                Self::GenericNewId {
                    interface: left_interface,
                    version: left_version,
                    id: left_id,
                },
                Self::GenericNewId {
                    interface: right_interface,
                    version: right_version,
                    id: right_id,
                },
            ) => {
                left_interface == right_interface
                    && left_version == right_version
                    && left_id == right_id
            }
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Array(left), Self::Array(right)) => left == right,
            (Self::Fd(left), Self::Fd(right)) => left.as_raw_fd() == right.as_raw_fd(),
            _ => false,
        }
    }
}

impl ArgValue {
    /// Whether this value may be supplied for an argument declared as `spec`.
    #[must_use]
    pub fn fits(&self, spec: &ArgSpec) -> bool {
        match (spec.kind, self) {
            (ArgKind::Uint, Self::Uint(_))
            | (ArgKind::Int, Self::Int(_))
            | (ArgKind::Fixed, Self::Fixed(_))
            | (ArgKind::NewId(_), Self::NewId(_))
            | (ArgKind::GenericNewId, Self::GenericNewId { .. })
            | (ArgKind::Array, Self::Array(_))
            | (ArgKind::Fd, Self::Fd(_)) => true,
            (ArgKind::Object, Self::Object(object)) => object.is_some() || spec.nullable,
            (ArgKind::String, Self::String(text)) => text.is_some() || spec.nullable,
            _ => false,
        }
    }

    fn variable_size(&self) -> usize {
        match self {
            Self::String(Some(text)) => marshalled_string_size(text.len()),
            Self::String(None) => 4,
            Self::Array(bytes) => marshalled_array_size(bytes.len()),
            Self::GenericNewId { interface, .. } => marshalled_string_size(interface.len()),
            _ => 0,
        }
    }
}

/// Supplier of descriptors received out of band.
pub trait FdSource {
    /// Removes the oldest pending descriptor.
    fn pop_fd(&mut self) -> Option<OwnedFd>;
}

impl FdSource for VecDeque<OwnedFd> {
    fn pop_fd(&mut self) -> Option<OwnedFd> {
        self.pop_front()
    }
}

/// Bytes of an encoded message plus the descriptors that must accompany them.
#[derive(Debug, Default)]
pub struct EncodedMessage {
    pub bytes: Vec<u8>,
    /// Descriptors in argument order.
    pub fds: Vec<OwnedFd>,
}

/// Decodes a payload (header excluded) against a compiled message.
///
/// Byte-carried arguments are decoded first; descriptor arguments are then
/// popped from `fds` in declaration order, so a malformed payload never
/// consumes descriptors. Every declared byte must be accounted for: leftover
/// payload is reported as [`WireError::TrailingBytes`].
pub fn decode_request(
    message: &CompiledMessage,
    payload: &[u8],
    fds: &mut impl FdSource,
) -> Result<Vec<ArgValue>, WireError> {
    let args = message.spec.args;
    let mut values: Vec<Option<ArgValue>> = args.iter().map(|_| None).collect();
    let mut cursor = PayloadCursor::new(payload);
    let mut generic: Option<(String, u32)> = None;

    for segment in message.plan.segments() {
        match segment {
            Segment::Block(block) => {
                for slot in &block.slots {
                    let spec = arg_spec(args, slot.arg)?;
                    let word = cursor.take_u32()?;
                    let decoded = match slot.part {
                        SlotPart::Value => Some(decode_word(spec, slot.arg, word)?),
                        SlotPart::GenericVersion => {
                            if let Some((_, version)) = generic.as_mut() {
                                *version = word;
                            }
                            None
                        }
                        SlotPart::GenericId => {
                            let id = ObjectId::new(word)
                                .ok_or(WireError::UnexpectedNull { index: slot.arg })?;
                            let (interface, version) = generic.take().ok_or(
                                WireError::ArgumentMismatch {
                                    index: slot.arg,
                                    expected: spec.kind,
                                },
                            )?;
                            Some(ArgValue::GenericNewId {
                                interface,
                                version,
                                id,
                            })
                        }
                    };
                    if let Some(value) = decoded {
                        store(&mut values, slot.arg, value);
                    }
                }
            }
            Segment::Variable(element) => {
                let spec = arg_spec(args, element.arg)?;
                match element.kind {
                    VariableKind::String => {
                        let text = read_string(&mut cursor, element.arg)?;
                        if text.is_none() && !spec.nullable {
                            return Err(WireError::UnexpectedNull { index: element.arg });
                        }
                        store(&mut values, element.arg, ArgValue::String(text));
                    }
                    VariableKind::Array => {
                        let bytes = read_sized(&mut cursor)?.to_vec();
                        cursor.align4()?;
                        store(&mut values, element.arg, ArgValue::Array(bytes));
                    }
                    VariableKind::GenericInterface => {
                        let interface = read_string(&mut cursor, element.arg)?
                            .ok_or(WireError::UnexpectedNull { index: element.arg })?;
                        generic = Some((interface, 0));
                    }
                }
            }
        }
    }

    if cursor.remaining() > 0 {
        return Err(WireError::TrailingBytes {
            remaining: cursor.remaining(),
        });
    }

    for &index in message.plan.fd_args() {
        let fd = fds
            .pop_fd()
            .ok_or(WireError::NoPendingDescriptor { index })?;
        store(&mut values, index, ArgValue::Fd(fd));
    }

    let expected = values.len();
    let decoded: Vec<ArgValue> = values.into_iter().flatten().collect();
    if decoded.len() != expected {
        return Err(WireError::ArityMismatch {
            expected,
            supplied: decoded.len(),
        });
    }
    Ok(decoded)
}

/// Encodes an event addressed from `sender`.
///
/// The total size is computed from the plan before any byte is written, so
/// the header always carries the final length. Descriptor arguments are
/// returned separately, in argument order, for ancillary transmission.
pub fn encode_event(
    sender: ObjectId,
    message: &CompiledMessage,
    args: Vec<ArgValue>,
) -> Result<EncodedMessage, WireError> {
    let specs = message.spec.args;
    if args.len() != specs.len() {
        return Err(WireError::ArityMismatch {
            expected: specs.len(),
            supplied: args.len(),
        });
    }
    for (index, (spec, value)) in specs.iter().zip(&args).enumerate() {
        if !value.fits(spec) {
            return Err(WireError::ArgumentMismatch {
                index,
                expected: spec.kind,
            });
        }
    }

    let variable: usize = message
        .plan
        .variables()
        .filter_map(|element| args.get(element.arg))
        .map(ArgValue::variable_size)
        .sum();
    let total = HEADER_SIZE + message.plan.fixed_size() + variable;
    let size = u16::try_from(total).map_err(|_| WireError::MessageTooLarge { size: total })?;

    let mut bytes = Vec::with_capacity(total);
    MessageHeader {
        object: sender.get(),
        opcode: message.opcode,
        size,
    }
    .write_into(&mut bytes);

    for segment in message.plan.segments() {
        match segment {
            Segment::Block(block) => {
                for slot in &block.slots {
                    let word = encode_word(&args, slot.arg, slot.part, specs)?;
                    bytes.extend_from_slice(&word.to_le_bytes());
                }
            }
            Segment::Variable(element) => match args.get(element.arg) {
                Some(ArgValue::String(text)) => write_string(&mut bytes, text.as_deref()),
                Some(ArgValue::GenericNewId { interface, .. }) => {
                    write_string(&mut bytes, Some(interface));
                }
                Some(ArgValue::Array(blob)) => write_blob(&mut bytes, blob),
                _ => return Err(mismatch(specs, element.arg)),
            },
        }
    }

    let fds = args
        .into_iter()
        .filter_map(|value| match value {
            ArgValue::Fd(fd) => Some(fd),
            _ => None,
        })
        .collect();
    Ok(EncodedMessage { bytes, fds })
}

fn arg_spec(args: &[ArgSpec], index: usize) -> Result<&ArgSpec, WireError> {
    args.get(index).ok_or(WireError::ArityMismatch {
        expected: args.len(),
        supplied: index + 1,
    })
}

fn store(values: &mut [Option<ArgValue>], index: usize, value: ArgValue) {
    if let Some(slot) = values.get_mut(index) {
        *slot = Some(value);
    }
}

fn decode_word(spec: &ArgSpec, index: usize, word: u32) -> Result<ArgValue, WireError> {
    match spec.kind {
        ArgKind::Uint => Ok(ArgValue::Uint(word)),
        ArgKind::Int => Ok(ArgValue::Int(word.cast_signed())),
        ArgKind::Fixed => Ok(ArgValue::Fixed(Fixed::from_raw(word.cast_signed()))),
        ArgKind::Object => {
            let object = ObjectId::new(word);
            if object.is_none() && !spec.nullable {
                return Err(WireError::UnexpectedNull { index });
            }
            Ok(ArgValue::Object(object))
        }
        ArgKind::NewId(_) => ObjectId::new(word)
            .map(ArgValue::NewId)
            .ok_or(WireError::UnexpectedNull { index }),
        ArgKind::GenericNewId
        | ArgKind::String
        | ArgKind::Array
        | ArgKind::Fd => Err(WireError::ArgumentMismatch {
            index,
            expected: spec.kind,
        }),
    }
}

fn read_sized<'a>(cursor: &mut PayloadCursor<'a>) -> Result<&'a [u8], WireError> {
    let declared = cursor.take_u32()?;
    let len = usize::try_from(declared).map_err(|_| {
        WireError::truncated(cursor.offset(), usize::MAX, cursor.remaining())
    })?;
    cursor.take(len)
}

/// Reads a length-prefixed string; a zero length is the null string.
fn read_string(cursor: &mut PayloadCursor<'_>, index: usize) -> Result<Option<String>, WireError> {
    let bytes = read_sized(cursor)?;
    let Some((&last, content)) = bytes.split_last() else {
        return Ok(None);
    };
    if last != 0 {
        return Err(WireError::MissingNul { index });
    }
    let text = std::str::from_utf8(content).map_err(|_| WireError::InvalidUtf8 { index })?;
    cursor.align4()?;
    Ok(Some(text.to_owned()))
}

fn encode_word(
    args: &[ArgValue],
    index: usize,
    part: SlotPart,
    specs: &[ArgSpec],
) -> Result<u32, WireError> {
    let word = match (part, args.get(index)) {
        (SlotPart::Value, Some(ArgValue::Uint(value))) => *value,
        (SlotPart::Value, Some(ArgValue::Int(value))) => value.cast_unsigned(),
        (SlotPart::Value, Some(ArgValue::Fixed(value))) => value.raw().cast_unsigned(),
        (SlotPart::Value, Some(ArgValue::Object(object))) => object.map_or(0, ObjectId::get),
        (SlotPart::Value, Some(ArgValue::NewId(id))) => id.get(),
        (SlotPart::GenericVersion, Some(ArgValue::GenericNewId { version, .. })) => *version,
        (SlotPart::GenericId, Some(ArgValue::GenericNewId { id, .. })) => id.get(),
        _ => return Err(mismatch(specs, index)),
    };
    Ok(word)
}

fn mismatch(specs: &[ArgSpec], index: usize) -> WireError {
    specs.get(index).map_or(
        WireError::ArityMismatch {
            expected: specs.len(),
            supplied: index + 1,
        },
        |spec| WireError::ArgumentMismatch {
            index,
            expected: spec.kind,
        },
    )
}

fn write_string(out: &mut Vec<u8>, text: Option<&str>) {
    let Some(text) = text else {
        out.extend_from_slice(&0_u32.to_le_bytes());
        return;
    };
    let len = text.len() + 1;
    // Message size is bounded by u16, so the length always fits.
    let prefix = u32::try_from(len).unwrap_or(u32::MAX);
    out.extend_from_slice(&prefix.to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    pad(out, len);
}

fn write_blob(out: &mut Vec<u8>, blob: &[u8]) {
    let prefix = u32::try_from(blob.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&prefix.to_le_bytes());
    out.extend_from_slice(blob);
    pad(out, blob.len());
}

fn pad(out: &mut Vec<u8>, len: usize) {
    out.resize(out.len() + round_up4(len) - len, 0);
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::kind::{Direction, MessageSpec};
    use crate::registry::registry;
    use crate::schema::{Interface, display, keyboard, registry as wl_registry, shm, surface};

    fn id(raw: u32) -> ObjectId {
        ObjectId::new(raw).expect("non-zero id")
    }

    fn dev_null() -> OwnedFd {
        OwnedFd::from(File::open("/dev/null").expect("open /dev/null"))
    }

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    #[test]
    fn zero_argument_request_decodes_to_nothing() {
        let message = registry()
            .request(Interface::Surface, surface::request::COMMIT)
            .expect("commit");
        let mut fds = VecDeque::new();
        assert_eq!(decode_request(message, &[], &mut fds), Ok(Vec::new()));
    }

    #[test]
    fn short_string_marshals_with_nul_and_padding() {
        let message = registry()
            .event(Interface::Seat, crate::schema::seat::event::NAME)
            .expect("seat.name");
        let encoded = encode_event(
            id(5),
            message,
            vec![ArgValue::String(Some("ab".to_owned()))],
        )
        .expect("encode");
        assert_eq!(encoded.bytes.len(), HEADER_SIZE + 8);
        assert_eq!(&encoded.bytes[HEADER_SIZE..], &[3, 0, 0, 0, b'a', b'b', 0, 0]);
        let header = MessageHeader::parse(&encoded.bytes).expect("header");
        assert_eq!(header.size, 16);
        assert_eq!(header.object, 5);
        assert_eq!(header.opcode, crate::schema::seat::event::NAME);
    }

    #[test]
    fn bind_decodes_the_generic_new_id() {
        let message = registry()
            .request(Interface::Registry, wl_registry::request::BIND)
            .expect("bind");
        let mut payload = words(&[4, 14]);
        payload.extend_from_slice(b"wl_compositor\0\0\0");
        payload.extend_from_slice(&words(&[4, 3]));
        let mut fds = VecDeque::new();
        let args = decode_request(message, &payload, &mut fds).expect("decode bind");
        assert_eq!(
            args,
            vec![
                ArgValue::Uint(4),
                ArgValue::GenericNewId {
                    interface: "wl_compositor".to_owned(),
                    version: 4,
                    id: id(3),
                },
            ]
        );
    }

    #[test]
    fn oversized_interface_name_is_truncation() {
        let message = registry()
            .request(Interface::Registry, wl_registry::request::BIND)
            .expect("bind");
        let mut payload = words(&[1, 64]);
        payload.extend_from_slice(b"wl_\0");
        let mut fds = VecDeque::new();
        assert!(matches!(
            decode_request(message, &payload, &mut fds),
            Err(WireError::Truncated { .. })
        ));
    }

    #[test]
    fn descriptors_are_popped_in_declaration_order() {
        let message = registry()
            .request(Interface::Shm, shm::request::CREATE_POOL)
            .expect("create_pool");
        let first = dev_null();
        let second = dev_null();
        let first_raw = first.as_raw_fd();
        let second_raw = second.as_raw_fd();
        let mut fds = VecDeque::from([first, second]);

        let args = decode_request(message, &words(&[7, 4096]), &mut fds).expect("decode");
        assert!(matches!(args.get(1), Some(ArgValue::Fd(fd)) if fd.as_raw_fd() == first_raw));
        assert_eq!(fds.front().map(AsRawFd::as_raw_fd), Some(second_raw));
    }

    #[test]
    fn missing_descriptor_is_reported() {
        let message = registry()
            .request(Interface::Shm, shm::request::CREATE_POOL)
            .expect("create_pool");
        let mut fds = VecDeque::new();
        assert_eq!(
            decode_request(message, &words(&[7, 4096]), &mut fds),
            Err(WireError::NoPendingDescriptor { index: 1 })
        );
    }

    #[rstest]
    #[case::trailing(words(&[1, 2]), WireError::TrailingBytes { remaining: 4 })]
    #[case::short(vec![1, 0], WireError::Truncated { offset: 0, needed: 4, available: 2 })]
    #[case::null_new_id(words(&[0]), WireError::UnexpectedNull { index: 0 })]
    fn malformed_sync_payloads_are_rejected(#[case] payload: Vec<u8>, #[case] expected: WireError) {
        let message = registry()
            .request(Interface::Display, display::request::SYNC)
            .expect("sync");
        let mut fds = VecDeque::new();
        assert_eq!(decode_request(message, &payload, &mut fds), Err(expected));
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let message = registry()
            .request(Interface::Toplevel, crate::schema::toplevel::request::SET_TITLE)
            .expect("set_title");
        let mut payload = words(&[4]);
        payload.extend_from_slice(b"abcd");
        let mut fds = VecDeque::new();
        assert_eq!(
            decode_request(message, &payload, &mut fds),
            Err(WireError::MissingNul { index: 0 })
        );
    }

    #[test]
    fn null_string_requires_nullable_declaration() {
        let message = registry()
            .request(Interface::Toplevel, crate::schema::toplevel::request::SET_TITLE)
            .expect("set_title");
        let mut fds = VecDeque::new();
        assert_eq!(
            decode_request(message, &words(&[0]), &mut fds),
            Err(WireError::UnexpectedNull { index: 0 })
        );
    }

    #[test]
    fn keymap_descriptor_travels_out_of_band() {
        let message = registry()
            .event(Interface::Keyboard, keyboard::event::KEYMAP)
            .expect("keymap");
        let fd = dev_null();
        let raw = fd.as_raw_fd();
        let encoded = encode_event(
            id(9),
            message,
            vec![ArgValue::Uint(1), ArgValue::Fd(fd), ArgValue::Uint(48)],
        )
        .expect("encode keymap");
        assert_eq!(encoded.bytes.len(), HEADER_SIZE + 8);
        assert_eq!(encoded.fds.iter().map(AsRawFd::as_raw_fd).collect::<Vec<_>>(), vec![raw]);
    }

    #[test]
    fn encoding_checks_arity_and_kinds() {
        let message = registry()
            .event(Interface::Display, display::event::DELETE_ID)
            .expect("delete_id");
        assert_eq!(
            encode_event(ObjectId::DISPLAY, message, Vec::new()).map(|m| m.bytes),
            Err(WireError::ArityMismatch {
                expected: 1,
                supplied: 0,
            })
        );
        assert_eq!(
            encode_event(ObjectId::DISPLAY, message, vec![ArgValue::Int(3)]).map(|m| m.bytes),
            Err(WireError::ArgumentMismatch {
                index: 0,
                expected: ArgKind::Uint,
            })
        );
    }

    #[test]
    fn oversized_events_are_rejected() {
        let message = registry()
            .event(Interface::Seat, crate::schema::seat::event::NAME)
            .expect("seat.name");
        let name = "x".repeat(usize::from(u16::MAX));
        assert!(matches!(
            encode_event(id(2), message, vec![ArgValue::String(Some(name))]),
            Err(WireError::MessageTooLarge { .. })
        ));
    }

    /// Clonable stand-in for a generated argument; descriptors are opened
    /// when the sample is materialised.
    #[derive(Debug, Clone)]
    enum Sample {
        Uint(u32),
        Int(i32),
        Fixed(i32),
        Object(Option<u32>),
        NewId(u32),
        Generic(String, u32, u32),
        Text(Option<String>),
        Blob(Vec<u8>),
        Fd,
    }

    impl Sample {
        fn spec(&self) -> ArgSpec {
            match self {
                Self::Uint(_) => ArgSpec::new("uint", ArgKind::Uint),
                Self::Int(_) => ArgSpec::new("int", ArgKind::Int),
                Self::Fixed(_) => ArgSpec::new("fixed", ArgKind::Fixed),
                Self::Object(_) => ArgSpec::nullable("object", ArgKind::Object),
                Self::NewId(_) => ArgSpec::new("new_id", ArgKind::NewId(Interface::Callback)),
                Self::Generic(..) => ArgSpec::new("generic", ArgKind::GenericNewId),
                Self::Text(_) => ArgSpec::nullable("text", ArgKind::String),
                Self::Blob(_) => ArgSpec::new("blob", ArgKind::Array),
                Self::Fd => ArgSpec::new("fd", ArgKind::Fd),
            }
        }

        fn value(&self) -> ArgValue {
            match self {
                Self::Uint(value) => ArgValue::Uint(*value),
                Self::Int(value) => ArgValue::Int(*value),
                Self::Fixed(raw) => ArgValue::Fixed(Fixed::from_raw(*raw)),
                Self::Object(raw) => ArgValue::Object(raw.and_then(ObjectId::new)),
                Self::NewId(raw) => ArgValue::NewId(id(*raw)),
                Self::Generic(interface, version, raw) => ArgValue::GenericNewId {
                    interface: interface.clone(),
                    version: *version,
                    id: id(*raw),
                },
                Self::Text(text) => ArgValue::String(text.clone()),
                Self::Blob(bytes) => ArgValue::Array(bytes.clone()),
                Self::Fd => ArgValue::Fd(dev_null()),
            }
        }
    }

    fn sample() -> impl Strategy<Value = Sample> {
        prop_oneof![
            any::<u32>().prop_map(Sample::Uint),
            any::<i32>().prop_map(Sample::Int),
            any::<i32>().prop_map(Sample::Fixed),
            proptest::option::of(1..=u32::MAX).prop_map(Sample::Object),
            (1..=u32::MAX).prop_map(Sample::NewId),
            ("[a-z_]{1,24}", any::<u32>(), 1..=u32::MAX)
                .prop_map(|(name, version, raw)| Sample::Generic(name, version, raw)),
            proptest::option::of("[ -~]{0,20}").prop_map(Sample::Text),
            proptest::collection::vec(any::<u8>(), 0..20).prop_map(Sample::Blob),
            Just(Sample::Fd),
        ]
    }

    fn leak_message(samples: &[Sample]) -> CompiledMessage {
        let args: &'static [ArgSpec] =
            Box::leak(samples.iter().map(Sample::spec).collect::<Vec<_>>().into_boxed_slice());
        let spec: &'static MessageSpec = Box::leak(Box::new(MessageSpec::new("sample", args)));
        CompiledMessage::compile(Interface::Surface, Direction::Event, 0, spec)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn encoded_size_matches_plan_and_decodes_back(
            samples in proptest::collection::vec(sample(), 0..10),
        ) {
            let message = leak_message(&samples);
            let expected: Vec<ArgValue> = samples.iter().map(Sample::value).collect();
            let supplied: Vec<ArgValue> = samples.iter().map(Sample::value).collect();

            let encoded = encode_event(id(1), &message, supplied).expect("encode");
            let header = MessageHeader::parse(&encoded.bytes).expect("header");
            prop_assert_eq!(usize::from(header.size), encoded.bytes.len());

            let variable: usize = message
                .plan
                .variables()
                .filter_map(|element| expected.get(element.arg))
                .map(ArgValue::variable_size)
                .sum();
            prop_assert_eq!(
                encoded.bytes.len(),
                HEADER_SIZE + message.plan.fixed_size() + variable
            );

            let mut fds: VecDeque<OwnedFd> = encoded.fds.into_iter().collect();
            let decoded = decode_request(&message, &encoded.bytes[HEADER_SIZE..], &mut fds)
                .expect("decode");
            prop_assert!(fds.is_empty());
            prop_assert_eq!(decoded.len(), expected.len());
            for (decoded, expected) in decoded.iter().zip(&expected) {
                match (decoded, expected) {
                    (ArgValue::Fd(_), ArgValue::Fd(_)) => {}
                    _ => prop_assert_eq!(decoded, expected),
                }
            }
        }
    }
}
