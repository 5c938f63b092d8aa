//! AniList 客户端模块 - 远端列表服务边界
//!
//! 本模块定义离线中心消费的远端接口，以及基于 reqwest 的
//! AniList GraphQL 实现。同步通道只用到一个操作：更新一条列表条目。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info};

use crate::error::{AnisyncSDKError, Result};

/// AniList GraphQL 入口
pub const ANILIST_API_URL: &str = "https://graphql.anilist.co";

/// 列表条目状态（AniList 线上取值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaListStatus {
    /// 观看/阅读中
    Current,
    /// 计划中
    Planning,
    /// 已完成
    Completed,
    /// 已放弃
    Dropped,
    /// 已暂停
    Paused,
    /// 重刷中
    Repeating,
}

/// 模糊日期 - AniList 的 (year, month, day) 三元组
///
/// 三个字段都可缺省，整个日期缺席时以 `None` 传递（而不是零值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyDateInput {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
}

impl FuzzyDateInput {
    /// 从 RFC3339 字符串解析模糊日期
    ///
    /// 空字符串或解析失败返回 `None`：日期解析失败只丢日期，不中断条目推送。
    pub fn from_rfc3339(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        match DateTime::parse_from_rfc3339(value) {
            Ok(parsed) => Some(Self {
                year: Some(parsed.year()),
                month: Some(parsed.month() as i32),
                day: Some(parsed.day() as i32),
            }),
            Err(_) => None,
        }
    }
}

/// 远端列表客户端 - 离线中心消费的唯一远端操作
///
/// `score` 为远端 0–100 刻度（调用方负责换算），日期缺席时传 `None`。
#[async_trait]
pub trait MediaListClient: Send + Sync {
    async fn update_media_list_entry(
        &self,
        media_id: i64,
        status: MediaListStatus,
        score: i64,
        progress: i64,
        start_date: Option<FuzzyDateInput>,
        end_date: Option<FuzzyDateInput>,
    ) -> Result<()>;
}

/// GraphQL 错误条目（AniList 响应的 errors 数组）
#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

/// AniList GraphQL 客户端
pub struct AnilistClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl AnilistClient {
    /// 创建新的 AniList 客户端
    ///
    /// 请求超时在这里施加：远端挂起不应无限占用离线中心的锁。
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AnisyncSDKError::Other(format!("创建 HTTP 客户端失败: {}", e)))?;

        info!("✅ AniList 客户端已创建");

        Ok(Self {
            client,
            api_url: ANILIST_API_URL.to_string(),
            token: token.into(),
        })
    }

    /// 覆盖 API 入口（测试/自建网关用）
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

const SAVE_MEDIA_LIST_ENTRY_MUTATION: &str = r#"
mutation (
  $mediaId: Int, $status: MediaListStatus, $scoreRaw: Int, $progress: Int,
  $startedAt: FuzzyDateInput, $completedAt: FuzzyDateInput
) {
  SaveMediaListEntry(
    mediaId: $mediaId, status: $status, scoreRaw: $scoreRaw, progress: $progress,
    startedAt: $startedAt, completedAt: $completedAt
  ) {
    id
  }
}
"#;

#[async_trait]
impl MediaListClient for AnilistClient {
    async fn update_media_list_entry(
        &self,
        media_id: i64,
        status: MediaListStatus,
        score: i64,
        progress: i64,
        start_date: Option<FuzzyDateInput>,
        end_date: Option<FuzzyDateInput>,
    ) -> Result<()> {
        debug!(media_id, "推送列表条目到 AniList");

        let body = json!({
            "query": SAVE_MEDIA_LIST_ENTRY_MUTATION,
            "variables": {
                "mediaId": media_id,
                "status": status,
                "scoreRaw": score,
                "progress": progress,
                "startedAt": start_date,
                "completedAt": end_date,
            },
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnisyncSDKError::Remote(format!("推送列表条目失败: {}", e)))?;

        let http_status = response.status();
        if !http_status.is_success() {
            error!(media_id, status = %http_status, "AniList 返回非成功状态码");
            return Err(AnisyncSDKError::Remote(format!(
                "AniList 返回状态码 {}",
                http_status
            )));
        }

        let parsed: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| AnisyncSDKError::Remote(format!("解析 AniList 响应失败: {}", e)))?;

        if let Some(errors) = parsed.errors {
            if let Some(first) = errors.first() {
                error!(media_id, error = %first.message, "AniList 返回 GraphQL 错误");
                return Err(AnisyncSDKError::Remote(first.message.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_date_from_rfc3339() {
        let date = FuzzyDateInput::from_rfc3339("2022-05-01T00:00:00Z").unwrap();
        assert_eq!(date.year, Some(2022));
        assert_eq!(date.month, Some(5));
        assert_eq!(date.day, Some(1));
    }

    #[test]
    fn test_fuzzy_date_empty_is_absent() {
        // 空字符串表示日期缺席，必须省略整个参数，不能填零值
        assert_eq!(FuzzyDateInput::from_rfc3339(""), None);
    }

    #[test]
    fn test_fuzzy_date_garbage_is_tolerated() {
        assert_eq!(FuzzyDateInput::from_rfc3339("not-a-date"), None);
        assert_eq!(FuzzyDateInput::from_rfc3339("2022-13-99"), None);
    }

    #[test]
    fn test_status_wire_format() {
        let status = serde_json::to_string(&MediaListStatus::Current).unwrap();
        assert_eq!(status, "\"CURRENT\"");
        let status: MediaListStatus = serde_json::from_str("\"PLANNING\"").unwrap();
        assert_eq!(status, MediaListStatus::Planning);
    }
}
