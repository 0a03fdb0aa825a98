//! FCPXML serialization.

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use thiserror::Error;

use super::document::{Asset, AssetClip, FcpxmlDocument, Format, SyncClip};

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE fcpxml>\n";

/// Errors serializing or saving a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("XML write error: {0}")]
    Xml(String),

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Serialize a document: XML declaration, doctype, then the element tree
/// indented by two spaces.
pub fn write_document(doc: &FcpxmlDocument) -> DocumentResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut root = BytesStart::new("fcpxml");
    root.push_attribute(("version", doc.version.as_str()));
    emit(&mut writer, Event::Start(root))?;

    emit(&mut writer, Event::Start(BytesStart::new("resources")))?;
    for format in &doc.resources.formats {
        write_format(&mut writer, format)?;
    }
    for asset in &doc.resources.assets {
        write_asset(&mut writer, asset)?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("resources")))?;

    emit(&mut writer, Event::Start(BytesStart::new("library")))?;
    let mut event = BytesStart::new("event");
    event.push_attribute(("name", doc.event.name.as_str()));
    emit(&mut writer, Event::Start(event))?;
    for clip in &doc.event.clips {
        write_sync_clip(&mut writer, clip)?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("event")))?;
    emit(&mut writer, Event::End(BytesEnd::new("library")))?;

    emit(&mut writer, Event::End(BytesEnd::new("fcpxml")))?;

    let body = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(format!("{HEADER}{body}\n"))
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> DocumentResult<()> {
    writer
        .write_event(event)
        .map_err(|e| DocumentError::Xml(e.to_string()))
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn write_format(writer: &mut XmlWriter, format: &Format) -> DocumentResult<()> {
    let mut elem = BytesStart::new("format");
    match format {
        Format::Video(v) => {
            elem.push_attribute(("id", v.id.as_str()));
            elem.push_attribute(("name", v.name.as_str()));
            elem.push_attribute(("frameDuration", v.frame_duration.to_string().as_str()));
            elem.push_attribute(("width", v.width.to_string().as_str()));
            elem.push_attribute(("height", v.height.to_string().as_str()));
        }
        Format::Audio(a) => {
            elem.push_attribute(("id", a.id.as_str()));
            elem.push_attribute(("name", a.name.as_str()));
            elem.push_attribute(("audioRate", a.audio_rate.to_string().as_str()));
            elem.push_attribute(("audioChannels", a.audio_channels.to_string().as_str()));
        }
    }
    emit(writer, Event::Empty(elem))
}

fn write_asset(writer: &mut XmlWriter, asset: &Asset) -> DocumentResult<()> {
    let mut elem = BytesStart::new("asset");
    elem.push_attribute(("id", asset.id.as_str()));
    elem.push_attribute(("name", asset.name.as_str()));
    elem.push_attribute(("start", asset.start.to_string().as_str()));
    elem.push_attribute(("duration", asset.duration.to_string().as_str()));
    elem.push_attribute(("format", asset.format.as_str()));
    elem.push_attribute(("hasVideo", flag(asset.has_video)));
    elem.push_attribute(("hasAudio", flag(asset.has_audio)));
    if asset.has_audio {
        elem.push_attribute(("audioSources", "1"));
        elem.push_attribute(("audioChannels", asset.audio_channels.to_string().as_str()));
        elem.push_attribute(("audioRate", asset.audio_rate.to_string().as_str()));
    }
    emit(writer, Event::Start(elem))?;

    let mut rep = BytesStart::new("media-rep");
    rep.push_attribute(("kind", "original-media"));
    rep.push_attribute(("src", asset.src.as_str()));
    emit(writer, Event::Empty(rep))?;

    emit(writer, Event::End(BytesEnd::new("asset")))
}

fn write_sync_clip(writer: &mut XmlWriter, clip: &SyncClip) -> DocumentResult<()> {
    let mut elem = BytesStart::new("sync-clip");
    elem.push_attribute(("name", clip.name.as_str()));
    elem.push_attribute(("duration", clip.duration.to_string().as_str()));
    elem.push_attribute(("format", clip.format.as_str()));
    elem.push_attribute(("tcFormat", clip.tc_format.as_str()));
    emit(writer, Event::Start(elem))?;
    emit(writer, Event::Start(BytesStart::new("spine")))?;

    let gap = &clip.spine.gap;
    let mut gap_elem = BytesStart::new("gap");
    gap_elem.push_attribute(("name", gap.name.as_str()));
    gap_elem.push_attribute(("offset", gap.offset.to_string().as_str()));
    gap_elem.push_attribute(("start", gap.start.to_string().as_str()));
    gap_elem.push_attribute(("duration", gap.duration.to_string().as_str()));
    emit(writer, Event::Start(gap_elem))?;
    write_asset_clip(writer, &gap.audio)?;
    emit(writer, Event::End(BytesEnd::new("gap")))?;

    write_asset_clip(writer, &clip.spine.video)?;

    emit(writer, Event::End(BytesEnd::new("spine")))?;
    emit(writer, Event::End(BytesEnd::new("sync-clip")))
}

fn write_asset_clip(writer: &mut XmlWriter, clip: &AssetClip) -> DocumentResult<()> {
    let mut elem = BytesStart::new("asset-clip");
    elem.push_attribute(("ref", clip.asset_ref.as_str()));
    elem.push_attribute(("name", clip.name.as_str()));
    elem.push_attribute(("offset", clip.offset.to_string().as_str()));
    elem.push_attribute(("start", clip.start.to_string().as_str()));
    elem.push_attribute(("duration", clip.duration.to_string().as_str()));
    if let Some(format) = &clip.format {
        elem.push_attribute(("format", format.as_str()));
    }
    elem.push_attribute(("tcFormat", clip.tc_format.as_str()));
    elem.push_attribute(("audioRole", clip.audio_role.as_str()));
    emit(writer, Event::Empty(elem))
}
