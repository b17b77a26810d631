//! # 容器封装模块
//!
//! 负责在负载外层加上标签前缀 (`TXT:` / `ENC:`) 与结束标记 (`<<EOF>>`)，
//! 以及从提取出的原始字节中解析、修复这层封装。本模块与图像无关。

use crate::constants::{END_MARKER, TAG_ENCRYPTED, TAG_LEN, TAG_PLAIN, TAG_SEARCH_WINDOW};
use log::{debug, warn};

/// 容器标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Plain,
    Encrypted,
    /// 没有找到任何已知标签。
    Unknown,
}

/// `unframe` 的解析结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unframed {
    pub tag: Tag,
    pub content: Vec<u8>,
    /// 是否找到了结束标记。为 `false` 时内容可能带有尾部垃圾。
    pub marker_found: bool,
}

/// 将内容封装为容器：`标签 + 内容 + 结束标记`。
pub fn frame(content: &[u8], encrypted: bool) -> Vec<u8> {
    let tag = if encrypted { TAG_ENCRYPTED } else { TAG_PLAIN };
    let mut out = Vec::with_capacity(tag.len() + content.len() + END_MARKER.len());
    out.extend_from_slice(tag);
    out.extend_from_slice(content);
    out.extend_from_slice(END_MARKER);
    out
}

/// 解析容器。永不失败，歧义由调用方处理。
///
/// 1. 截断到第一个结束标记之前；没有标记时保留全部并记录。
/// 2. 开头是已知标签则直接剥离。
/// 3. 否则在前 [`TAG_SEARCH_WINDOW`] 个字节内搜索标签，丢弃其之前的字节。
/// 4. 仍未找到则标记为 [`Tag::Unknown`]。
pub fn unframe(raw: &[u8]) -> Unframed {
    let (body, marker_found) = match find(raw, END_MARKER) {
        Some(end) => (&raw[..end], true),
        None => {
            warn!("End marker missing, keeping all {} extracted bytes", raw.len());
            (raw, false)
        }
    };

    if let Some(tag) = tag_at(body, 0) {
        return Unframed {
            tag,
            content: body[TAG_LEN..].to_vec(),
            marker_found,
        };
    }

    let window = &body[..body.len().min(TAG_SEARCH_WINDOW)];
    let hit = [find(window, TAG_ENCRYPTED), find(window, TAG_PLAIN)]
        .into_iter()
        .flatten()
        .min();

    match hit.and_then(|pos| tag_at(body, pos).map(|tag| (pos, tag))) {
        Some((pos, tag)) => {
            warn!("Container tag found at offset {pos} instead of 0, discarding leading bytes");
            Unframed {
                tag,
                content: body[pos + TAG_LEN..].to_vec(),
                marker_found,
            }
        }
        None => {
            debug!("No container tag within the first {TAG_SEARCH_WINDOW} bytes");
            Unframed {
                tag: Tag::Unknown,
                content: body.to_vec(),
                marker_found,
            }
        }
    }
}

fn tag_at(body: &[u8], pos: usize) -> Option<Tag> {
    let prefix = body.get(pos..pos + TAG_LEN)?;
    if prefix == TAG_ENCRYPTED {
        Some(Tag::Encrypted)
    } else if prefix == TAG_PLAIN {
        Some(Tag::Plain)
    } else {
        None
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
