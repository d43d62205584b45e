use crate::asset_graph::{AssetObject, ObjectId, PayloadCompression, TextureData, TexturePayload};
use crate::session::ExportSession;
use anyhow::{Context, Result, bail};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use lz4_flex::block::decompress;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct TextureDescriptor<'a> {
    name: String,
    class: &'a str,
    width: u32,
    height: u32,
    format: Option<&'a str>,
    payload_bytes: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CubemapDescriptor {
    name: String,
    faces: Vec<Option<String>>,
}

fn detect_payload_ext(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 8 && data[0..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        return Some("png");
    }
    if data.len() >= 3 && data[0..3] == [0xFF, 0xD8, 0xFF] {
        return Some("jpg");
    }
    if data.len() >= 6 && (&data[0..6] == b"GIF87a" || &data[0..6] == b"GIF89a") {
        return Some("gif");
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("webp");
    }
    if data.len() >= 4 && &data[0..4] == b"DDS " {
        return Some("dds");
    }
    None
}

fn encode_raw_to_png(payload: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
    let pixels = width.checked_mul(height)? as usize;
    if pixels == 0 {
        return None;
    }

    let (bytes, color_type) = if payload.len() >= pixels * 4 {
        (&payload[..pixels * 4], ColorType::Rgba8)
    } else if payload.len() >= pixels * 3 {
        (&payload[..pixels * 3], ColorType::Rgb8)
    } else if payload.len() >= pixels {
        (&payload[..pixels], ColorType::L8)
    } else {
        return None;
    };

    let mut out = Vec::<u8>::new();
    PngEncoder::new(&mut out)
        .write_image(bytes, width, height, color_type.into())
        .ok()?;
    Some(out)
}

/// Largest decompressed payload accepted from a dump; the lz4 decoder allocates
/// the declared size up front.
const MAX_PAYLOAD_BYTES: usize = 256 * 1024 * 1024;

fn decode_payload(payload: &TexturePayload) -> Result<Vec<u8>> {
    match payload.compression {
        PayloadCompression::None => Ok(payload.data.clone()),
        PayloadCompression::Lz4 => {
            if payload.uncompressed_size > MAX_PAYLOAD_BYTES {
                bail!(
                    "lz4 payload declares {} bytes, limit is {}",
                    payload.uncompressed_size,
                    MAX_PAYLOAD_BYTES
                );
            }
            decompress(&payload.data, payload.uncompressed_size)
                .context("Failed decompressing lz4 texture payload")
        }
    }
}

/// Picks the bytes and extension to write for a texture, if any.
fn payload_image(data: &TextureData) -> Result<Option<(&'static str, Vec<u8>)>> {
    let Some(payload) = &data.payload else {
        return Ok(None);
    };
    let bytes = decode_payload(payload)?;
    if let Some(ext) = detect_payload_ext(&bytes) {
        return Ok(Some((ext, bytes)));
    }
    Ok(encode_raw_to_png(&bytes, data.width, data.height).map(|png| ("png", png)))
}

pub fn export_texture(
    session: &mut ExportSession<'_>,
    object: &AssetObject,
    data: &TextureData,
) -> Result<()> {
    if session.config().write_texture_payloads {
        match payload_image(data) {
            Ok(Some((ext, bytes))) => {
                let Some(mut archive) = session.create_archive(object, &format!(".{}", ext)) else {
                    return Ok(());
                };
                archive
                    .write_all(&bytes)
                    .with_context(|| format!("Failed writing {}", archive.path().display()))?;
                let path = archive.finish()?;
                log::info!("exported texture {}", path.display());
                return Ok(());
            }
            Ok(None) => {}
            Err(err) => log::warn!(
                "texture {} payload unusable, writing descriptor: {:#}",
                session.file_stem(object),
                err
            ),
        }
    }

    let descriptor = TextureDescriptor {
        name: session.file_stem(object),
        class: object.class_name(),
        width: data.width,
        height: data.height,
        format: data.format.as_deref(),
        payload_bytes: data.payload.as_ref().map(|p| p.uncompressed_size),
    };
    let Some(mut archive) = session.create_archive(object, ".texture.json") else {
        return Ok(());
    };
    serde_json::to_writer_pretty(&mut archive, &descriptor)
        .with_context(|| format!("Failed writing {}", archive.path().display()))?;
    let path = archive.finish()?;
    log::info!("exported texture descriptor {}", path.display());
    Ok(())
}

pub fn export_cubemap(
    session: &mut ExportSession<'_>,
    object: &AssetObject,
    faces: &[Option<ObjectId>],
) -> Result<()> {
    let graph = session.graph();
    let descriptor = CubemapDescriptor {
        name: session.file_stem(object),
        faces: faces
            .iter()
            .map(|f| f.and_then(|id| graph.name_of(id, session.reader())))
            .collect(),
    };
    let Some(mut archive) = session.create_archive(object, ".cubemap.json") else {
        return Ok(());
    };
    serde_json::to_writer_pretty(&mut archive, &descriptor)
        .with_context(|| format!("Failed writing {}", archive.path().display()))?;
    let path = archive.finish()?;
    log::info!("exported cubemap {}", path.display());

    for face in faces.iter().flatten() {
        match graph.get(*face) {
            Some(f) if f.is_texture() => session.export_object(*face),
            Some(f) => bail!(
                "cubemap face {} is a {}, not a texture",
                face,
                f.class_name()
            ),
            None => log::warn!("cubemap face {} not in asset graph", face),
        }
    }
    Ok(())
}
