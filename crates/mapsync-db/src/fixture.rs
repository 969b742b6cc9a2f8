//! Byte builders for synthetic catalogs and indices.
//!
//! The record layout here is written out by hand rather than derived from
//! [`crate::catalog::layout`], so decoding a fixture checks the field plan
//! against an independent description of the format.

use crate::varint;

#[derive(Debug, Clone)]
pub struct RecordSpec {
    pub hash: String,
    pub set_id: i32,
    pub beatmap_id: i32,
    pub artist: String,
    pub title: String,
    pub label: String,
    /// Entries per star-rating table.
    pub star_ratings: usize,
    pub timing_points: usize,
}

impl RecordSpec {
    pub fn new(hash: impl Into<String>, set_id: i32) -> Self {
        Self {
            hash: hash.into(),
            set_id,
            beatmap_id: set_id * 10,
            artist: "Artist".to_string(),
            title: "Title".to_string(),
            label: "Insane".to_string(),
            star_ratings: 2,
            timing_points: 3,
        }
    }
}

#[derive(Default)]
pub struct Writer(pub Vec<u8>);

impl Writer {
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Tagged string; `None` writes the absent indicator.
    pub fn string(&mut self, s: Option<&str>) -> &mut Self {
        match s {
            None => self.u8(0x00),
            Some(s) => {
                self.u8(0x0b);
                self.0.extend(varint::encode(s.len() as u64));
                self.0.extend_from_slice(s.as_bytes());
                self
            }
        }
    }
}

pub fn record_bytes(version: i32, spec: &RecordSpec) -> Vec<u8> {
    let mut w = Writer::default();
    if version < 20191106 {
        w.i32(0);
    }
    w.string(Some(&spec.artist))
        .string(None)
        .string(Some(&spec.title))
        .string(Some("タイトル"))
        .string(Some("Mapper"))
        .string(Some(&spec.label))
        .string(Some("audio.mp3"))
        .string(Some(&spec.hash))
        .string(Some("map.osu"))
        .u8(4)
        .i16(100)
        .i16(50)
        .i16(1)
        .i64(637_000_000_000_000_000);
    if version < 20140609 {
        w.u8(9).u8(4).u8(6).u8(8);
    } else {
        w.f32(9.3).f32(4.0).f32(6.0).f32(8.5);
    }
    w.f64(1.4);
    for mode in 0..4 {
        w.i32(spec.star_ratings as i32);
        for i in 0..spec.star_ratings {
            w.u8(0x08).i32(i as i32 * 64).u8(if version < 20250107 { 0x0d } else { 0x0c });
            let rating = 3.0 + mode as f64 + i as f64 * 0.5;
            if version < 20250107 {
                w.f64(rating);
            } else {
                w.f32(rating as f32);
            }
        }
    }
    w.i32(90).i32(95_000).i32(40_000);
    w.i32(spec.timing_points as i32);
    for i in 0..spec.timing_points {
        w.f64(333.33).f64(i as f64 * 1000.0).u8(u8::from(i == 0));
    }
    w.i32(spec.beatmap_id)
        .i32(spec.set_id)
        .i32(0)
        .u8(9)
        .u8(9)
        .u8(9)
        .u8(9)
        .i16(0)
        .f32(0.7)
        .u8(0)
        .string(Some("source"))
        .string(Some("tag1 tag2"))
        .i16(0)
        .string(None)
        .u8(1)
        .i64(0)
        .u8(0)
        .string(Some(&format!("{} {} - {}", spec.set_id, spec.artist, spec.title)))
        .i64(0)
        .u8(0)
        .u8(0)
        .u8(0)
        .u8(0)
        .u8(0);
    if version < 20140609 {
        w.i16(0);
    }
    w.i32(0).u8(0);
    w.0
}

pub fn header_bytes(version: i32, record_count: i32) -> Vec<u8> {
    let mut w = Writer::default();
    w.i32(version)
        .i32(12)
        .u8(1)
        .i64(0)
        .string(Some("player"))
        .i32(record_count);
    w.0
}

/// Header, records and a trailing permissions field.
pub fn catalog_bytes(version: i32, records: &[RecordSpec]) -> Vec<u8> {
    let mut out = header_bytes(version, records.len() as i32);
    for spec in records {
        out.extend(record_bytes(version, spec));
    }
    out.extend_from_slice(&4i32.to_le_bytes());
    out
}

pub fn index_bytes(version: i32, groups: &[(&str, &[&str])]) -> Vec<u8> {
    let mut w = Writer::default();
    w.i32(version).i32(groups.len() as i32);
    for (name, items) in groups {
        w.string(Some(*name)).i32(items.len() as i32);
        for item in items.iter() {
            w.string(Some(*item));
        }
    }
    w.0
}
