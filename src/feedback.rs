//! Launcher script-filter JSON output.
//! One item per query decision: a placeholder while the user types, an
//! error item on failure, or an actionable translation whose cmd modifier
//! requests speech playback.

use serde::Serialize;
use tracing::warn;

use crate::action::SPEAK_PREFIX;
use crate::translate::{Decision, FailureKind, WaitingReason};

#[derive(Debug, Serialize)]
pub struct Feedback {
    items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct Item {
    uid: &'static str,
    title: String,
    subtitle: String,
    arg: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    mods: Option<Mods>,
}

#[derive(Debug, Serialize)]
struct Mods {
    cmd: ModItem,
}

#[derive(Debug, Serialize)]
struct ModItem {
    subtitle: String,
    arg: String,
}

impl Feedback {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!(error = %e, "feedback serialization failed");
            r#"{"items":[]}"#.to_string()
        })
    }
}

/// Render a decision as the launcher's result list.
pub fn render(decision: &Decision, raw_text: &str) -> Feedback {
    let item = match decision {
        Decision::Waiting(WaitingReason::Empty) => Item {
            uid: "empty",
            title: "请输入要翻译的中文文本".to_string(),
            subtitle: "输入中文后将显示翻译结果 | Cmd+回车朗读".to_string(),
            arg: String::new(),
            valid: false,
            mods: None,
        },
        Decision::Waiting(WaitingReason::StillTyping) => Item {
            uid: "waiting",
            title: format!("输入中: {raw_text}"),
            subtitle: "继续输入完整内容以开始翻译...".to_string(),
            arg: String::new(),
            valid: false,
            mods: None,
        },
        Decision::Failed { kind: FailureKind::ConfigMissing, .. } => Item {
            uid: "error",
            title: "请先配置API Key".to_string(),
            subtitle: "运行 colloq config set --api-key <key> 进行配置".to_string(),
            arg: String::new(),
            valid: false,
            mods: None,
        },
        Decision::Failed { message, .. } => Item {
            uid: "error",
            title: "翻译失败".to_string(),
            subtitle: message.clone(),
            arg: String::new(),
            valid: false,
            mods: None,
        },
        Decision::Translated { text, .. } => Item {
            uid: "translation",
            title: text.clone(),
            subtitle: format!("原文: {raw_text} | 回车复制 | Cmd+回车朗读"),
            arg: text.clone(),
            valid: true,
            mods: Some(Mods {
                cmd: ModItem {
                    subtitle: format!("朗读: {text}"),
                    arg: format!("{SPEAK_PREFIX}{text}"),
                },
            }),
        },
    };

    Feedback { items: vec![item] }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(feedback: &Feedback) -> serde_json::Value {
        serde_json::from_str(&feedback.to_json()).unwrap()
    }

    #[test]
    fn translated_item_is_actionable_with_speak_modifier() {
        let decision = Decision::Translated {
            text: "The weather is really nice today".to_string(),
            from_cache: false,
        };
        let value = parsed(&render(&decision, "今天天气真好啊"));
        let item = &value["items"][0];

        assert_eq!(item["valid"], true);
        assert_eq!(item["arg"], "The weather is really nice today");
        assert_eq!(
            item["mods"]["cmd"]["arg"],
            "speak:The weather is really nice today"
        );
        assert!(item["subtitle"].as_str().unwrap().contains("今天天气真好啊"));
    }

    #[test]
    fn waiting_items_are_not_actionable() {
        let value = parsed(&render(&Decision::Waiting(WaitingReason::StillTyping), "你好，"));
        let item = &value["items"][0];

        assert_eq!(item["valid"], false);
        assert!(item["title"].as_str().unwrap().contains("你好，"));
        assert!(item.get("mods").is_none());
    }

    #[test]
    fn failed_item_carries_the_message() {
        let decision = Decision::Failed {
            kind: FailureKind::Transport,
            message: "network error: connection refused".to_string(),
        };
        let value = parsed(&render(&decision, "今天天气真好啊"));
        let item = &value["items"][0];

        assert_eq!(item["valid"], false);
        assert_eq!(item["subtitle"], "network error: connection refused");
    }

    #[test]
    fn config_missing_points_at_the_config_command() {
        let decision = Decision::Failed {
            kind: FailureKind::ConfigMissing,
            message: "API key not configured".to_string(),
        };
        let value = parsed(&render(&decision, "今天天气真好啊"));
        assert!(value["items"][0]["subtitle"]
            .as_str()
            .unwrap()
            .contains("config set"));
    }
}
