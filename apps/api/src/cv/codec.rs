//! Record Codec — projection between [`EditableCv`] and [`CvRecord`].
//!
//! Both directions are pure and infallible. Work and education entries are
//! flattened to their four text fields joined with [`FIELD_DELIMITER`]; the
//! delimiter is not escaped, so a field that itself contains `|` shifts the
//! text after it into the following fields on decode (and anything past the
//! fourth field is lost). Decoding never reports this, it just degrades.

use crate::cv::models::{CvRecord, EditableCv, EducationEntry, WorkEntry};

pub const FIELD_DELIMITER: char = '|';

/// Number of positional fields in an encoded work or education entry.
pub const ENTRY_FIELDS: usize = 4;

/// An entry that round-trips through a single delimiter-joined string.
pub trait FlatEntry: Sized {
    /// Fields in their fixed persisted order.
    fn fields(&self) -> [&str; ENTRY_FIELDS];

    fn from_fields(id: String, fields: [String; ENTRY_FIELDS]) -> Self;

    fn decoded_id(index: usize) -> String;
}

impl FlatEntry for WorkEntry {
    fn fields(&self) -> [&str; ENTRY_FIELDS] {
        [&self.title, &self.company, &self.period, &self.description]
    }

    fn from_fields(id: String, fields: [String; ENTRY_FIELDS]) -> Self {
        let [title, company, period, description] = fields;
        Self {
            id,
            title,
            company,
            period,
            description,
        }
    }

    fn decoded_id(index: usize) -> String {
        format!("work-{index}")
    }
}

impl FlatEntry for EducationEntry {
    fn fields(&self) -> [&str; ENTRY_FIELDS] {
        [&self.degree, &self.institution, &self.period, &self.description]
    }

    fn from_fields(id: String, fields: [String; ENTRY_FIELDS]) -> Self {
        let [degree, institution, period, description] = fields;
        Self {
            id,
            degree,
            institution,
            period,
            description,
        }
    }

    fn decoded_id(index: usize) -> String {
        format!("edu-{index}")
    }
}

/// Joins the entry's fields, keeping empty segments (`"Title||2020|"`).
pub fn encode_entry<T: FlatEntry>(entry: &T) -> String {
    let mut buf = String::new();
    for (i, field) in entry.fields().iter().enumerate() {
        if i > 0 {
            buf.push(FIELD_DELIMITER);
        }
        buf.push_str(field);
    }
    buf
}

/// Splits `raw` positionally. Missing trailing fields become empty strings;
/// segments beyond the fourth are dropped.
pub fn decode_entry<T: FlatEntry>(index: usize, raw: &str) -> T {
    let mut fields: [String; ENTRY_FIELDS] = Default::default();
    for (slot, segment) in fields.iter_mut().zip(raw.split(FIELD_DELIMITER)) {
        *slot = segment.to_string();
    }
    T::from_fields(T::decoded_id(index), fields)
}

/// Builds the editable model from a stored record.
///
/// `summary`, `projects` and `certifications` come back empty since the
/// record never carries them. Entry ids are position based, so decoding the
/// same record twice yields equal models.
pub fn decode(record: &CvRecord) -> EditableCv {
    EditableCv {
        name: record.name.clone(),
        email: record.email.clone(),
        phone: record.phone.clone(),
        work_experience: decode_list(&record.work_experience),
        education: decode_list(&record.education),
        skills: record.skills.clone(),
        photo: record.photo.clone(),
        ..Default::default()
    }
}

/// Projects the editable model onto the persisted record shape.
///
/// Drops `summary`, `projects` and `certifications`. Performs no validation;
/// the required-field gate lives in [`crate::cv::validation`].
pub fn encode(cv: &EditableCv) -> CvRecord {
    CvRecord {
        name: cv.name.clone(),
        email: cv.email.clone(),
        phone: cv.phone.clone(),
        work_experience: cv.work_experience.iter().map(encode_entry).collect(),
        education: cv.education.iter().map(encode_entry).collect(),
        skills: cv.skills.clone(),
        photo: cv.photo.clone(),
    }
}

fn decode_list<T: FlatEntry>(raw: &[String]) -> Vec<T> {
    raw.iter()
        .enumerate()
        .map(|(i, s)| decode_entry(i, s))
        .collect()
}
