use crate::refs::{ObjectReferences, RefType};
use pdf_writer::{Date as PDate, Pdf, TextStr};

/// Document metadata written to the PDF's information dictionary
#[derive(Default, Debug, Clone)]
pub struct Info {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    /// Comma separated keywords
    pub keywords: Option<String>,
    /// The application that made the original pages, e.g. the scanner software.
    /// This crate always records itself as the producer.
    pub creator: Option<String>,
}

impl Info {
    /// Create a new info block, with all metadata set to [None]
    pub fn new() -> Info {
        Info::default()
    }

    pub fn title<S: ToString>(&mut self, title: S) -> &mut Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author<S: ToString>(&mut self, author: S) -> &mut Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn subject<S: ToString>(&mut self, subject: S) -> &mut Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn keywords<S: ToString>(&mut self, keywords: S) -> &mut Self {
        self.keywords = Some(keywords.to_string());
        self
    }

    pub fn creator<S: ToString>(&mut self, creator: S) -> &mut Self {
        self.creator = Some(creator.to_string());
        self
    }

    fn now() -> PDate {
        use chrono::prelude::*;
        let now = Local::now();
        let offset = now.offset().fix();
        let offset_hours = offset.local_minus_utc() / (60 * 60);
        let offset_minutes = ((offset.local_minus_utc() - (offset_hours * (60 * 60))) / 60).abs();
        PDate::new(now.year() as u16)
            .month(now.month() as u8)
            .day(now.day() as u8)
            .hour(now.hour() as u8)
            .minute(now.minute() as u8)
            .second(now.second() as u8)
            .utc_offset_hour(offset_hours as i8)
            .utc_offset_minute(offset_minutes as u8)
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, writer: &mut Pdf) {
        let id = refs.gen(RefType::Info);
        let mut info = writer.document_info(id);

        if let Some(title) = &self.title {
            info.title(TextStr(title.as_str()));
        }
        if let Some(author) = &self.author {
            info.author(TextStr(author.as_str()));
        }
        if let Some(subject) = &self.subject {
            info.subject(TextStr(subject.as_str()));
        }
        if let Some(keywords) = &self.keywords {
            info.keywords(TextStr(keywords.as_str()));
        }
        if let Some(creator) = &self.creator {
            info.creator(TextStr(creator.as_str()));
        }
        info.producer(TextStr(concat!(
            env!("CARGO_PKG_NAME"),
            " v",
            env!("CARGO_PKG_VERSION")
        )));

        let now = Self::now();
        info.creation_date(now);
        info.modified_date(now);
    }
}
