use serde::{Deserialize, Deserializer, Serialize};

use crate::models::batch::{Batch, IntSequence, SortedBatch};

/// `POST /process-*` 的请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SortRequest {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub to_sort: Vec<IntSequence>,
}

impl SortRequest {
    /// 解析请求体中的第一个 JSON 值，其后的内容忽略（与旧接口的流式解码一致）
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::Deserializer::from_slice(body)
            .into_iter::<SortRequest>()
            .next()
        {
            Some(parsed) => parsed,
            // 空请求体：交给 from_slice 生成 EOF 错误
            None => serde_json::from_slice(body),
        }
    }
}

impl From<SortRequest> for Batch {
    fn from(request: SortRequest) -> Self {
        Batch::new(request.to_sort)
    }
}

/// 响应体，字段名保持旧接口的写法（含空格）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortResponse {
    #[serde(rename = "sorted arrays")]
    pub sorted_arrays: Vec<IntSequence>,
    /// 纳秒数，以字符串形式返回
    #[serde(rename = "time ns")]
    pub time_ns: String,
}

impl From<SortedBatch> for SortResponse {
    fn from(batch: SortedBatch) -> Self {
        Self {
            time_ns: batch.elapsed_nanos().to_string(),
            sorted_arrays: batch.arrays,
        }
    }
}

// `"to_sort": null` 与缺省等价，均视为空批次；内层的 `null` 视为空数组
fn deserialize_null_as_empty<'de, D>(deserializer: D) -> Result<Vec<IntSequence>, D::Error>
where
    D: Deserializer<'de>,
{
    let arrays = Option::<Vec<Option<IntSequence>>>::deserialize(deserializer)?;
    Ok(arrays
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}
