use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::StreamExt;
use reqwest::Client;

use crate::error::PipelineError;

/// 图片来源获取器：远程 URL 抓取 / 内联 base64 解码。
///
/// 不做重试；失败原因以 [`PipelineError`] 返回，由调用方按条目记录。
#[derive(Clone)]
pub struct ImageAcquirer {
    client: Client,
    max_bytes: u64,
}

impl ImageAcquirer {
    pub fn new(client: Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    /// 抓取远程图片原始字节。非 2xx 视为失败。
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let resp = self.client.get(url).send().await?.error_for_status()?;

        if let Some(len) = resp.content_length()
            && len > self.max_bytes
        {
            return Err(PipelineError::Acquisition(format!(
                "image too large: {len} bytes (limit {})",
                self.max_bytes
            )));
        }

        let mut body = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(PipelineError::Acquisition(format!(
                    "image too large: exceeds {} bytes",
                    self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// 解码内联 base64 图片，兼容 `data:<mime>;base64,<payload>` 形式。
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, PipelineError> {
    let trimmed = payload.trim();
    let data = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };
    // 部分客户端会在长字符串中插入换行
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(PipelineError::Decode("empty image payload".to_string()));
    }
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PipelineError::Decode(format!("invalid base64: {e}")))
}

/// 截断过长的 URL，避免日志与错误信息被撑爆（按字符计）。
pub fn truncate_source(source: &str, max_chars: usize) -> &str {
    match source.char_indices().nth(max_chars) {
        Some((idx, _)) => &source[..idx],
        None => source,
    }
}
