use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    DrawMode, PrizeStatus, draw_entity, participant_entity, prize_entity, winner_entity,
};
use crate::error::{AppError, AppResult};

/// 操作员标识最大长度（与 draws.executed_by 列一致）
const MAX_OPERATOR_ID_LEN: usize = 255;

/// 开奖请求
///
/// 字段同时接受旧版前端使用的 camelCase 名称（contestId / executedBy / numberOfWinners / prizeIds）。
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ExecuteDrawRequest {
    /// 活动ID
    #[serde(default, alias = "contestId")]
    pub contest_id: Option<i64>,
    /// 触发开奖的操作员（仅记录审计）
    #[serde(default, alias = "executedBy", alias = "operatorId")]
    pub operator_id: Option<String>,
    /// 中奖人数
    #[serde(
        default,
        alias = "numberOfWinners",
        alias = "requestedWinnerCount"
    )]
    pub requested_winner_count: Option<i64>,
    /// 奖品ID列表，按位置与中奖者配对；缺省或 null 表示该中奖者暂不指定奖品
    #[serde(default, alias = "prizeIds")]
    pub prize_ids: Option<Vec<Option<i64>>>,
}

/// 校验后的开奖指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    pub contest_id: i64,
    pub operator_id: Option<String>,
    pub requested_count: usize,
    /// 已截断至 requested_count
    pub prize_assignments: Vec<Option<i64>>,
}

impl TryFrom<ExecuteDrawRequest> for DrawCommand {
    type Error = AppError;

    fn try_from(req: ExecuteDrawRequest) -> AppResult<Self> {
        let contest_id = req
            .contest_id
            .ok_or_else(|| AppError::InvalidRequest("Missing contest_id".into()))?;
        if contest_id <= 0 {
            return Err(AppError::InvalidRequest(
                "contest_id must be a positive integer".into(),
            ));
        }

        let requested = req
            .requested_winner_count
            .ok_or_else(|| AppError::InvalidRequest("Missing requested_winner_count".into()))?;
        if requested <= 0 || requested > i64::from(i32::MAX) {
            return Err(AppError::InvalidRequest(
                "requested_winner_count must be a positive integer".into(),
            ));
        }
        let requested_count = requested as usize;

        let operator_id = match req.operator_id.map(|s| s.trim().to_string()) {
            Some(s) if s.is_empty() => None,
            Some(s) if s.chars().count() > MAX_OPERATOR_ID_LEN => {
                return Err(AppError::InvalidRequest(format!(
                    "operator_id must be at most {MAX_OPERATOR_ID_LEN} characters"
                )));
            }
            other => other,
        };

        let mut prize_assignments = req.prize_ids.unwrap_or_default();
        prize_assignments.truncate(requested_count);
        if let Some(bad) = prize_assignments.iter().flatten().find(|id| **id <= 0) {
            return Err(AppError::InvalidRequest(format!("Invalid prize id {bad}")));
        }

        Ok(DrawCommand {
            contest_id,
            operator_id,
            requested_count,
            prize_assignments,
        })
    }
}

/// 分配结果草稿：尚未持久化的中奖者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerDraft {
    pub participant_id: i64,
    /// 参与者名称快照
    pub winner_name: Option<String>,
    pub prize_id: Option<i64>,
    pub position: i32,
}

/// 开奖记录
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    pub id: i64,
    pub contest_id: i64,
    pub draw_mode: DrawMode,
    pub executed_by: Option<String>,
    pub total_winners: i32,
    pub created_at: DateTime<Utc>,
}

impl From<draw_entity::Model> for DrawResponse {
    fn from(m: draw_entity::Model) -> Self {
        DrawResponse {
            id: m.id,
            contest_id: m.contest_id,
            draw_mode: m.draw_mode,
            executed_by: m.executed_by,
            total_winners: m.total_winners,
            created_at: m.created_at,
        }
    }
}

/// 中奖者的参与者信息
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    pub id: i64,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub entry_timestamp: DateTime<Utc>,
}

impl From<participant_entity::Model> for ParticipantSummary {
    fn from(m: participant_entity::Model) -> Self {
        ParticipantSummary {
            id: m.id,
            name: m.name,
            phone_number: m.phone_number,
            entry_timestamp: m.entry_timestamp,
        }
    }
}

/// 中奖者的奖品信息
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<prize_entity::Model> for PrizeSummary {
    fn from(m: prize_entity::Model) -> Self {
        PrizeSummary {
            id: m.id,
            name: m.name,
            description: m.description,
        }
    }
}

/// 中奖记录（附带参与者与奖品详情）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WinnerDetailResponse {
    pub id: i64,
    pub draw_id: i64,
    /// 本次开奖中的顺序 (从 0 开始)
    pub position: i32,
    pub participant: ParticipantSummary,
    pub prize: Option<PrizeSummary>,
    pub prize_status: PrizeStatus,
    pub notified: bool,
}

impl WinnerDetailResponse {
    pub fn new(
        winner: winner_entity::Model,
        participant: participant_entity::Model,
        prize: Option<prize_entity::Model>,
    ) -> Self {
        WinnerDetailResponse {
            id: winner.id,
            draw_id: winner.draw_id,
            position: winner.position,
            participant: participant.into(),
            prize: prize.map(Into::into),
            prize_status: winner.prize_status,
            notified: winner.notified,
        }
    }
}

/// 开奖详情
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawDetailResponse {
    pub draw: DrawResponse,
    pub winners: Vec<WinnerDetailResponse>,
}

/// 开奖结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawExecutionResponse {
    pub draw: DrawResponse,
    pub winners: Vec<WinnerDetailResponse>,
    /// 本次开奖后剩余名额
    pub remaining_slots: i64,
}

/// 活动名额概况
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CapacityResponse {
    pub contest_id: i64,
    pub total_slots: i64,
    pub issued_winners: i64,
    pub remaining_slots: i64,
}

/// 开奖历史查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawListQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(contest_id: Option<i64>, count: Option<i64>) -> ExecuteDrawRequest {
        ExecuteDrawRequest {
            contest_id,
            requested_winner_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request() {
        let cmd = DrawCommand::try_from(ExecuteDrawRequest {
            contest_id: Some(7),
            operator_id: Some("  ops@example.com ".into()),
            requested_winner_count: Some(2),
            prize_ids: Some(vec![Some(10), None, Some(11)]),
        })
        .unwrap();

        assert_eq!(cmd.contest_id, 7);
        assert_eq!(cmd.operator_id.as_deref(), Some("ops@example.com"));
        assert_eq!(cmd.requested_count, 2);
        assert_eq!(cmd.prize_assignments, vec![Some(10), None]);
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        for req in [request(None, Some(1)), request(Some(1), None)] {
            let err = DrawCommand::try_from(req).unwrap_err();
            assert_eq!(err.code(), "INVALID_REQUEST");
        }
    }

    #[test]
    fn test_non_positive_values_are_invalid() {
        for req in [
            request(Some(0), Some(1)),
            request(Some(-3), Some(1)),
            request(Some(1), Some(0)),
            request(Some(1), Some(-2)),
        ] {
            assert!(matches!(
                DrawCommand::try_from(req),
                Err(AppError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn test_blank_operator_is_dropped() {
        let cmd = DrawCommand::try_from(ExecuteDrawRequest {
            operator_id: Some("   ".into()),
            ..request(Some(1), Some(1))
        })
        .unwrap();
        assert!(cmd.operator_id.is_none());
    }

    #[test]
    fn test_invalid_prize_id_rejected() {
        let err = DrawCommand::try_from(ExecuteDrawRequest {
            prize_ids: Some(vec![Some(0)]),
            ..request(Some(1), Some(1))
        })
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_legacy_field_names() {
        let req: ExecuteDrawRequest = serde_json::from_str(
            r#"{"contestId": 3, "executedBy": "admin", "numberOfWinners": 2, "prizeIds": [5]}"#,
        )
        .unwrap();
        let cmd = DrawCommand::try_from(req).unwrap();
        assert_eq!(cmd.contest_id, 3);
        assert_eq!(cmd.operator_id.as_deref(), Some("admin"));
        assert_eq!(cmd.requested_count, 2);
        assert_eq!(cmd.prize_assignments, vec![Some(5)]);
    }

    #[test]
    fn test_fractional_count_fails_to_parse() {
        let result: Result<ExecuteDrawRequest, _> =
            serde_json::from_str(r#"{"contest_id": 1, "requested_winner_count": 2.5}"#);
        assert!(result.is_err());
    }
}
