use proptest::prelude::*;

use tagfile::block::{TagBlockHeader, BLOCK_KIND};
use tagfile::cursor::Writer;
use tagfile::data::RawData;
use tagfile::primitive::{ArgbColor, Bounds, EnumValue, FlagsValue, Vector3d};
use tagfile::{
    read_asset, read_asset_file, write_asset, write_asset_file, Asset, Engine, Error, FieldDef, FieldKind, Header,
    ReadOptions, StringId, StructDef, Tag, TagBlock, TagRef, TagSchema, TagStruct, Unsupported, Value, Warning,
};

const LIST: Tag = Tag::new(b"list");
const LOOP: Tag = Tag::new(b"lsnd");
const SOUND: Tag = Tag::new(b"snd!");

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Root struct with a single block of tag references.
fn list_schema() -> TagSchema {
    let entry = StructDef::new("entry").tag_ref("sound");
    TagSchema::new(LIST, 1..=1, StructDef::new("list").block("entries", entry))
}

fn list_asset(engine: Engine, names: &[&str]) -> Asset {
    let entries = names
        .iter()
        .map(|name| TagStruct::new().with("sound", Value::TagRef(TagRef::new(SOUND, *name))))
        .collect();
    let root = TagStruct::new().with("entries", Value::Block(TagBlock::new(entries)));
    Asset::new(Header::new(LIST, 1, engine), root)
}

/// Every field family, an inline struct holding a deferred name, and
/// engine-specific fields.
fn loop_schema() -> TagSchema {
    let detail = StructDef::new("detail_sound")
        .tag_ref("sound")
        .field("period", FieldKind::RealBounds)
        .field("yaw", FieldKind::AngleBounds)
        .field("name", FieldKind::StringId);
    let placement = StructDef::new("placement")
        .field("origin", FieldKind::Vector3d)
        .tag_ref("marker_sound");
    let root = StructDef::new("sound_looping")
        .field(
            "flags",
            FieldKind::WordFlags {
                bits: vec!["deafening".into(), "not_a_loop".into()],
            },
        )
        .pad(2)
        .field(
            "mode",
            FieldKind::ShortEnum {
                options: vec!["default".into(), "loud".into()],
            },
        )
        .push(FieldDef::new("marker", FieldKind::Long).only(&[Engine::Blam]))
        .field("label", FieldKind::String)
        .field("tint", FieldKind::ArgbColor)
        .field("placement", FieldKind::Struct { def: placement })
        .tag_ref("continuous")
        .block("details", detail)
        .field("script", FieldKind::Data);
    TagSchema::new(LOOP, 1..=3, root)
}

fn detail(name: &str) -> TagStruct {
    TagStruct::new()
        .with("sound", Value::TagRef(TagRef::new(SOUND, format!("ambience\\{name}"))))
        .with("period", Value::RealBounds(Bounds { min: 1.0, max: 4.5 }))
        .with("yaw", Value::AngleBounds(Bounds { min: 0.0, max: 0.0 }))
        .with("name", Value::StringId(StringId::new(name)))
}

fn loop_asset(engine: Engine, flags: u16, mode: i16, names: &[String], script: Vec<u8>) -> Asset {
    let mut root = TagStruct::new()
        .with("flags", Value::Flags(FlagsValue { raw: u32::from(flags), set: vec![] }))
        .with("mode", Value::Enum(EnumValue { raw: i32::from(mode), symbol: None }));
    if engine == Engine::Blam {
        root.push("marker", Value::Long(-7));
    }
    let placement = TagStruct::new()
        .with("origin", Value::Vector3d(Vector3d { x: 1.0, y: 2.0, z: 3.0 }))
        .with("marker_sound", Value::TagRef(TagRef::new(SOUND, "marker")));
    let root = root
        .with("label", Value::String("rain".into()))
        .with("tint", Value::ArgbColor(ArgbColor { a: 1.0, r: 0.5, g: 0.25, b: 0.0 }))
        .with("placement", Value::Struct(placement))
        .with("continuous", Value::TagRef(TagRef::none()))
        .with(
            "details",
            Value::Block(TagBlock::new(names.iter().map(|n| detail(n)).collect())),
        )
        .with("script", Value::Data(RawData::new(script)));
    Asset::new(Header::new(LOOP, 2, engine), root)
}

fn file(engine: Engine, body: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut w = Writer::new();
    Header::new(LIST, 1, engine).write(&mut w);
    body(&mut w);
    w.into_bytes()
}

fn block_header(w: &mut Writer, count: i32, stride: i32) {
    TagBlockHeader {
        kind: BLOCK_KIND,
        version: 0,
        count,
        stride,
    }
    .write(w);
}

/// Inline part of a list entry on `MLAB`.
fn tag_ref_placeholder(w: &mut Writer, name_length: i32) {
    w.write_tag(SOUND);
    w.write_i32(0);
    w.write_i32(name_length);
    w.write_i32(-1);
}

/// A reference, a nested block of references, then a data span: one
/// payload of each kind at the root level.
fn node_schema() -> TagSchema {
    let child = StructDef::new("child").tag_ref("sound");
    let node = StructDef::new("node")
        .tag_ref("sound")
        .block("children", child)
        .field("script", FieldKind::Data);
    TagSchema::new(LIST, 1..=1, node)
}

fn entries(asset: &Asset) -> &TagBlock {
    asset.root().and_then(|r| r.block("entries")).expect("entries block")
}

// ── Layout ───────────────────────────────────────────────────────────────────

#[test]
fn names_follow_both_fixed_regions() {
    let bytes = file(Engine::Mlab, |w| {
        block_header(w, 1, 12);
        w.write_i32(2);
        w.write_u32(0);
        w.write_u32(0);
        block_header(w, 2, 16);
        tag_ref_placeholder(w, 5);
        tag_ref_placeholder(w, 5);
        w.write_bytes(b"alphabravo");
    });

    let parsed = read_asset(&bytes, &list_schema(), &ReadOptions::default()).unwrap();
    assert!(parsed.warnings.is_empty());
    let names: Vec<&str> = entries(&parsed.asset)
        .iter()
        .map(|e| e.tag_ref("sound").unwrap().name.as_str())
        .collect();
    assert_eq!(names, ["alpha", "bravo"]);

    assert_eq!(write_asset(&parsed.asset, &list_schema()).unwrap(), bytes);
}

#[test]
fn writer_places_names_after_fixed_regions() {
    let bytes = write_asset(&list_asset(Engine::Mlab, &["alpha", "bravo"]), &list_schema()).unwrap();
    // header, root block header, root element, entries header, two refs
    let names_at = 64 + 16 + 12 + 16 + 2 * 16;
    assert_eq!(&bytes[names_at..], b"alphabravo");
    assert_eq!(&bytes[names_at - 32 + 8..names_at - 32 + 12], &5i32.to_le_bytes());
}

#[test]
fn zero_length_name_reads_nothing() {
    let bytes = file(Engine::Mlab, |w| {
        block_header(w, 1, 12);
        w.write_i32(1);
        w.write_u32(0);
        w.write_u32(0);
        block_header(w, 1, 16);
        tag_ref_placeholder(w, 0);
    });
    let parsed = read_asset(&bytes, &list_schema(), &ReadOptions::strict()).unwrap();
    let r = entries(&parsed.asset).elements[0].tag_ref("sound").unwrap();
    assert!(r.name.is_empty());
    assert_eq!(r.index, -1);
}

#[test]
fn empty_block_header_follows_engine() {
    for engine in Engine::ALL {
        let asset = list_asset(engine, &[]);
        let bytes = write_asset(&asset, &list_schema()).unwrap();
        let root_fixed = list_schema().root.fixed_size(engine);
        let empty_header = if engine == Engine::Lamb { 16 } else { 0 };
        assert_eq!(bytes.len(), 64 + 16 + root_fixed + empty_header, "{engine}");

        let parsed = read_asset(&bytes, &list_schema(), &ReadOptions::strict()).unwrap();
        assert!(entries(&parsed.asset).is_empty());
    }
}

#[test]
fn lamb_name_length_is_big_endian() {
    let bytes = write_asset(&list_asset(Engine::Lamb, &["abc"]), &list_schema()).unwrap();
    let entry_at = 64 + 16 + 12 + 16;
    assert_eq!(&bytes[entry_at + 4..entry_at + 8], &[0, 0, 0, 0]);
    assert_eq!(&bytes[entry_at + 8..entry_at + 12], &[0, 0, 0, 3]);
    assert_eq!(&bytes[bytes.len() - 3..], b"abc");

    let parsed = read_asset(&bytes, &list_schema(), &ReadOptions::strict()).unwrap();
    assert_eq!(entries(&parsed.asset).elements[0].tag_ref("sound").unwrap().name, "abc");
}

#[test]
fn root_payloads_keep_announcement_order() {
    let bytes = file(Engine::Mlab, |w| {
        block_header(w, 1, 16 + 12 + 20);
        tag_ref_placeholder(w, 3);
        w.write_i32(1);
        w.write_u32(0);
        w.write_u32(0);
        w.write_i32(4);
        w.pad(16);
        w.write_bytes(b"top");
        block_header(w, 1, 16);
        tag_ref_placeholder(w, 5);
        w.write_bytes(b"child");
        w.write_bytes(b"DATA");
    });
    let mut nested = Writer::new();
    block_header(&mut nested, 1, 16);
    // header, root block header, root fixed region
    assert_eq!(&bytes[128..131], b"top");
    assert_eq!(&bytes[131..147], nested.as_bytes());
    assert_eq!(&bytes[163..168], b"child");
    assert_eq!(&bytes[168..], b"DATA");

    let parsed = read_asset(&bytes, &node_schema(), &ReadOptions::strict()).unwrap();
    let child = TagStruct::new().with("sound", Value::TagRef(TagRef::new(SOUND, "child")));
    let root = TagStruct::new()
        .with("sound", Value::TagRef(TagRef::new(SOUND, "top")))
        .with("children", Value::Block(TagBlock::new(vec![child])))
        .with("script", Value::Data(RawData::new(b"DATA".to_vec())));
    assert_eq!(parsed.asset, Asset::new(Header::new(LIST, 1, Engine::Mlab), root));

    assert_eq!(write_asset(&parsed.asset, &node_schema()).unwrap(), bytes);
}

#[test]
fn lamb_string_id_is_a_big_endian_short() {
    let schema = TagSchema::new(
        LIST,
        1..=1,
        StructDef::new("anim").field("name", FieldKind::StringId).field("n", FieldKind::Short),
    );
    let bytes = file(Engine::Lamb, |w| {
        block_header(w, 1, 6);
        w.write_bytes(&[0, 4, 0, 0]);
        w.write_i16(7);
        w.write_bytes(b"walk");
    });

    let parsed = read_asset(&bytes, &schema, &ReadOptions::strict()).unwrap();
    let root = parsed.asset.root().unwrap();
    assert_eq!(root.get("name"), Some(&Value::StringId(StringId::new("walk"))));
    assert_eq!(root.get("n"), Some(&Value::Short(7)));
    assert_eq!(write_asset(&parsed.asset, &schema).unwrap(), bytes);
}

#[test]
fn latin1_names_round_trip() {
    let bytes = file(Engine::Mlab, |w| {
        block_header(w, 1, 12);
        w.write_i32(1);
        w.write_u32(0);
        w.write_u32(0);
        block_header(w, 1, 16);
        tag_ref_placeholder(w, 4);
        w.write_bytes(b"caf\xE9");
    });
    let parsed = read_asset(&bytes, &list_schema(), &ReadOptions::strict()).unwrap();
    assert_eq!(entries(&parsed.asset).elements[0].tag_ref("sound").unwrap().name, "caf\u{e9}");
    assert_eq!(write_asset(&parsed.asset, &list_schema()).unwrap(), bytes);

    let wide = list_asset(Engine::Mlab, &["\u{3b1}"]);
    let err = write_asset(&wide, &list_schema()).unwrap_err();
    assert!(matches!(err, Error::ValueMismatch { .. }));
}

#[test]
fn nan_reals_keep_their_bits() {
    let schema = TagSchema::new(LIST, 1..=1, StructDef::new("gain").field("gain", FieldKind::Real));
    let quiet = f32::from_bits(0x7FC0_1234);
    let asset = Asset::new(
        Header::new(LIST, 1, Engine::Blam),
        TagStruct::new().with("gain", Value::Real(quiet)),
    );
    let bytes = write_asset(&asset, &schema).unwrap();
    assert_eq!(&bytes[bytes.len() - 4..], &0x7FC0_1234u32.to_le_bytes());

    let parsed = read_asset(&bytes, &schema, &ReadOptions::strict()).unwrap();
    let Some(Value::Real(gain)) = parsed.asset.root().unwrap().get("gain") else {
        panic!("gain missing");
    };
    assert_eq!(gain.to_bits(), 0x7FC0_1234);
    // NaN is unequal to itself, so compare the encodings instead.
    assert_ne!(parsed.asset, asset);
    assert_eq!(write_asset(&parsed.asset, &schema).unwrap(), bytes);
}

// ── Round trips ──────────────────────────────────────────────────────────────

#[test]
fn every_engine_round_trips() {
    let names = ["wind".to_string(), "".to_string(), "thunder".to_string()];
    for engine in Engine::ALL {
        let asset = loop_asset(engine, 0x8001, 1, &names, b"\x01\x02\x03".to_vec());
        let bytes = write_asset(&asset, &loop_schema()).unwrap();
        let parsed = read_asset(&bytes, &loop_schema(), &ReadOptions::strict()).unwrap();
        assert_eq!(write_asset(&parsed.asset, &loop_schema()).unwrap(), bytes, "{engine}");

        let root = parsed.asset.root().unwrap();
        let Some(Value::Flags(flags)) = root.get("flags") else {
            panic!("flags missing on {engine}");
        };
        assert_eq!(flags.raw, 0x8001);
        assert_eq!(flags.set, ["deafening"]);
        let Some(Value::Enum(mode)) = root.get("mode") else {
            panic!("mode missing on {engine}");
        };
        assert_eq!(mode.symbol.as_deref(), Some("loud"));
        assert_eq!(root.get("marker").is_some(), engine == Engine::Blam);
        assert_eq!(root.get("label"), Some(&Value::String("rain".into())));

        let Some(Value::Struct(placement)) = root.get("placement") else {
            panic!("placement missing on {engine}");
        };
        assert_eq!(placement.tag_ref("marker_sound").unwrap().name, "marker");
        assert!(root.tag_ref("continuous").unwrap().is_none());

        let details = root.block("details").unwrap();
        assert_eq!(details.len(), 3);
        assert_eq!(details.elements[2].tag_ref("sound").unwrap().name, "ambience\\thunder");
        assert_eq!(
            details.elements[2].get("name"),
            Some(&Value::StringId(StringId::new("thunder")))
        );
        assert_eq!(details.elements[1].get("name"), Some(&Value::StringId(StringId::default())));

        let Some(Value::Data(script)) = root.get("script") else {
            panic!("script missing on {engine}");
        };
        assert_eq!(script.bytes, [1, 2, 3]);
    }
}

#[test]
fn parsing_twice_is_equal() {
    let asset = loop_asset(Engine::Mlab, 1, 0, &["a".to_string()], vec![9; 7]);
    let bytes = write_asset(&asset, &loop_schema()).unwrap();
    let first = read_asset(&bytes, &loop_schema(), &ReadOptions::default()).unwrap();
    let second = read_asset(&bytes, &loop_schema(), &ReadOptions::default()).unwrap();
    assert_eq!(first.asset, second.asset);
}

#[test]
fn json_form_packs_back_to_the_same_bytes() {
    let asset = loop_asset(Engine::Blam, 2, 0, &["x".to_string()], vec![]);
    let bytes = write_asset(&asset, &loop_schema()).unwrap();
    let parsed = read_asset(&bytes, &loop_schema(), &ReadOptions::default()).unwrap();

    let json = serde_json::to_string(&parsed.asset).unwrap();
    let back: Asset = serde_json::from_str(&json).unwrap();
    assert_eq!(write_asset(&back, &loop_schema()).unwrap(), bytes);

    // Unprintable codes take their hex form and still pack.
    let codes = TagSchema::new(
        LIST,
        1..=1,
        StructDef::new("codes").field("code", FieldKind::Tag).tag_ref("target"),
    );
    let mut target = TagRef::new(Tag([0xFF; 4]), "x");
    target.index = 3;
    let root = TagStruct::new()
        .with("code", Value::Tag(Tag(*b"ab\0\0")))
        .with("target", Value::TagRef(target));
    let bytes = write_asset(&Asset::new(Header::new(LIST, 1, Engine::Mlab), root), &codes).unwrap();
    let parsed = read_asset(&bytes, &codes, &ReadOptions::strict()).unwrap();

    let json = serde_json::to_string(&parsed.asset).unwrap();
    assert!(json.contains("\"0x61620000\""), "{json}");
    assert!(json.contains("\"0xffffffff\""), "{json}");
    let back: Asset = serde_json::from_str(&json).unwrap();
    assert_eq!(back, parsed.asset);
    assert_eq!(write_asset(&back, &codes).unwrap(), bytes);
}

#[test]
fn file_helpers_round_trip() {
    let dir = std::env::temp_dir().join(format!("tagfile-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("rain.sound_looping");

    let asset = list_asset(Engine::Blam, &["drip"]);
    write_asset_file(&path, &asset, &list_schema()).unwrap();
    let parsed = read_asset_file(&path, &list_schema(), &ReadOptions::strict()).unwrap();
    assert_eq!(parsed.asset, asset);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_is_io_error() {
    let err = read_asset_file("/nonexistent/none.tag", &list_schema(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

// ── Failure modes ────────────────────────────────────────────────────────────

#[test]
fn trailing_bytes_warn_by_default() {
    let mut bytes = write_asset(&list_asset(Engine::Mlab, &["a"]), &list_schema()).unwrap();
    bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);

    let parsed = read_asset(&bytes, &list_schema(), &ReadOptions::default()).unwrap();
    assert_eq!(parsed.warnings, [Warning::StructuralCorruption { bytes_left: 3 }]);
    assert_eq!(entries(&parsed.asset).len(), 1);

    let err = read_asset(&bytes, &list_schema(), &ReadOptions::strict()).unwrap_err();
    assert!(matches!(err, Error::StructuralCorruption { bytes_left: 3 }));
}

#[test]
fn oversized_count_is_truncation() {
    let bytes = file(Engine::Mlab, |w| {
        block_header(w, 1, 12);
        w.write_i32(10);
        w.write_u32(0);
        w.write_u32(0);
        block_header(w, 10, 16);
        w.pad(4 * 16);
    });
    let err = read_asset(&bytes, &list_schema(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TruncatedStream { need: 160, have: 64, .. }));
}

#[test]
fn name_past_end_is_truncation() {
    let bytes = file(Engine::Mlab, |w| {
        block_header(w, 1, 12);
        w.write_i32(1);
        w.write_u32(0);
        w.write_u32(0);
        block_header(w, 1, 16);
        tag_ref_placeholder(w, 8);
        w.write_bytes(b"abc");
    });
    let err = read_asset(&bytes, &list_schema(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TruncatedStream { need: 8, have: 3, .. }));
}

#[test]
fn unknown_engine_is_unsupported() {
    let mut bytes = write_asset(&list_asset(Engine::Mlab, &[]), &list_schema()).unwrap();
    bytes[60..64].copy_from_slice(b"XXXX");
    let err = read_asset(&bytes, &list_schema(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion(Unsupported::Engine(_))));
}

#[test]
fn version_outside_schema_is_unsupported() {
    let mut asset = list_asset(Engine::Mlab, &[]);
    asset.header.version = 4;
    let bytes = write_asset(&asset, &list_schema()).unwrap();
    let err = read_asset(&bytes, &list_schema(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedVersion(Unsupported::Version { found: 4, min: 1, max: 1, .. })
    ));
}

#[test]
fn group_must_match_schema() {
    let bytes = write_asset(&list_asset(Engine::Mlab, &[]), &list_schema()).unwrap();
    let err = read_asset(&bytes, &loop_schema(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::GroupMismatch { expected, found } if expected == LOOP && found == LIST));
}

#[test]
fn short_header_is_truncation() {
    let err = read_asset(&[0u8; 20], &list_schema(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TruncatedStream { offset: 0, need: 64, have: 20 }));
}

// ── Properties ───────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn write_read_write_is_stable(
        flags in any::<u16>(),
        mode in any::<i16>(),
        names in prop::collection::vec("[a-z_]{0,12}", 0..4),
        script in prop::collection::vec(any::<u8>(), 0..32),
        engine in prop::sample::select(Engine::ALL.to_vec()),
    ) {
        let asset = loop_asset(engine, flags, mode, &names, script);
        let bytes = write_asset(&asset, &loop_schema()).unwrap();
        let parsed = read_asset(&bytes, &loop_schema(), &ReadOptions::strict()).unwrap();
        prop_assert_eq!(write_asset(&parsed.asset, &loop_schema()).unwrap(), bytes);
    }
}
