use std::borrow::Cow;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::error::Category;
use serde_json::value::RawValue;

use crate::error::DecodeErrorCode;

const NOTICE_TYPE_KEY: &str = "noticeType";
const DATA_KEY: &str = "data";
const TIMESTAMP_KEY: &str = "timestamp";

/// One notice, borrowed from the line it was decoded from.
///
/// `data` is the payload's original JSON text. It is never re-serialized, so
/// key order, spacing and number formatting survive into the console line.
/// It is only owned when the line had to be repaired (invalid UTF-8).
#[derive(Debug, Clone, Default)]
pub struct NoticeRecord<'a> {
    pub notice_type: String,
    pub data: Option<Cow<'a, RawValue>>,
    pub timestamp: String,
}

/// Outcome of [`NoticeRecord::decode`]: always a record, plus the reason it
/// is incomplete when decoding did not fully succeed.
#[derive(Debug, Clone)]
pub struct Decoded<'a> {
    pub record: NoticeRecord<'a>,
    pub issue: Option<(DecodeErrorCode, String)>,
}

impl<'a> NoticeRecord<'a> {
    /// Best-effort decode of one line (without its terminating newline).
    ///
    /// Never fails. If the line is not a JSON object every field is empty;
    /// otherwise each known member is recovered independently and a member of
    /// the wrong type is left empty. Invalid UTF-8 is replaced with U+FFFD and
    /// the repaired line is decoded the same way.
    pub fn decode(line: &'a [u8]) -> Decoded<'a> {
        let utf8_err = match std::str::from_utf8(line) {
            Ok(text) => return decode_text(text),
            Err(err) => err,
        };

        let repaired = String::from_utf8_lossy(line);
        let Decoded { record, issue } = decode_text(&repaired);
        Decoded {
            record: record.into_owned(),
            issue: issue.or_else(|| Some((DecodeErrorCode::InvalidUtf8, utf8_err.to_string()))),
        }
    }

    /// Detaches the record from the line it was decoded from.
    pub fn into_owned(self) -> NoticeRecord<'static> {
        NoticeRecord {
            notice_type: self.notice_type,
            data: self.data.map(|data| Cow::Owned(data.into_owned())),
            timestamp: self.timestamp,
        }
    }

    /// Payload text, or `""` when the notice carried no `data` member.
    pub fn data_text(&self) -> &str {
        self.data.as_deref().map(RawValue::get).unwrap_or("")
    }

    /// Appends `"<timestamp> <noticeType> <data>\n"` to `out`.
    pub fn write_line(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.timestamp.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.notice_type.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.data_text().as_bytes());
        out.push(b'\n');
    }
}

fn decode_text(text: &str) -> Decoded<'_> {
    let members: Members<'_> = match serde_json::from_str(text) {
        Ok(members) => members,
        Err(err) => {
            let code = match err.classify() {
                Category::Data => DecodeErrorCode::NotAnObject,
                Category::Io | Category::Syntax | Category::Eof => DecodeErrorCode::JsonParse,
            };
            return Decoded {
                record: NoticeRecord::default(),
                issue: Some((code, err.to_string())),
            };
        }
    };

    let mut problems = Vec::new();
    let notice_type = members.string(NOTICE_TYPE_KEY, &mut problems);
    let timestamp = members.string(TIMESTAMP_KEY, &mut problems);
    let data = members.get(DATA_KEY).map(Cow::Borrowed);

    let issue = if problems.is_empty() {
        None
    } else {
        Some((DecodeErrorCode::FieldType, problems.join("; ")))
    };

    Decoded {
        record: NoticeRecord {
            notice_type,
            data,
            timestamp,
        },
        issue,
    }
}

/// Object members in source order, values left as raw JSON text.
struct Members<'a>(Vec<(String, &'a RawValue)>);

impl<'a> Members<'a> {
    /// Last member named exactly `key`, else the last whose name matches
    /// ignoring ASCII case.
    fn get(&self, key: &str) -> Option<&'a RawValue> {
        let mut folded = None;
        for (name, value) in self.0.iter().rev() {
            if name == key {
                return Some(*value);
            }
            if folded.is_none() && name.eq_ignore_ascii_case(key) {
                folded = Some(*value);
            }
        }
        folded
    }

    /// String member `key`; `null` counts as absent.
    fn string(&self, key: &str, problems: &mut Vec<String>) -> String {
        let Some(raw) = self.get(key) else {
            return String::new();
        };
        match serde_json::from_str::<Option<String>>(raw.get()) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                problems.push(format!("`{key}`: {err}"));
                String::new()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Members<'de> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MembersVisitor;

        impl<'de> Visitor<'de> for MembersVisitor {
            type Value = Members<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut members = Vec::new();
                while let Some(entry) = map.next_entry::<String, &'de RawValue>()? {
                    members.push(entry);
                }
                Ok(Members(members))
            }
        }

        deserializer.deserialize_map(MembersVisitor)
    }
}
