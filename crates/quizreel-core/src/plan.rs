use serde::{Deserialize, Serialize};

use crate::types::{FieldRole, NarrationUnit, Record, RevealStage, StageKind, TextBlock};

/// How a record is revealed on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealMode {
    /// Question, then options, then answer, then explanation; one audio unit per field.
    #[default]
    Progressive,
    /// One frame with every field and a single narration of all of them.
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationPlan {
    pub stages: Vec<RevealStage>,
    pub units: Vec<NarrationUnit>,
}

pub fn plan(record: &Record, mode: RevealMode) -> NarrationPlan {
    match mode {
        RevealMode::Progressive => plan_progressive(record),
        RevealMode::Single => plan_single(record),
    }
}

fn stage_kind_for(role: FieldRole) -> StageKind {
    match role {
        FieldRole::Question => StageKind::Question,
        FieldRole::Option(_) => StageKind::Options,
        FieldRole::Answer => StageKind::Answer,
        FieldRole::Explanation => StageKind::Explanation,
    }
}

fn plan_progressive(record: &Record) -> NarrationPlan {
    let mut stages: Vec<RevealStage> = Vec::new();
    let mut units = Vec::new();
    let mut visible: Vec<TextBlock> = Vec::new();

    for field in record.fields() {
        let kind = stage_kind_for(field.role);
        let text = field.display_text();
        visible.push(TextBlock {
            role: field.role,
            text: text.clone(),
        });

        // Options share one stage; every option is already visible when it opens.
        if kind == StageKind::Options {
            if stages.last().map(|s| s.kind) != Some(StageKind::Options) {
                let mut blocks = visible.clone();
                blocks.extend(remaining_options(record, field.role));
                stages.push(RevealStage { kind, blocks });
            }
        } else {
            stages.push(RevealStage {
                kind,
                blocks: visible.clone(),
            });
        }

        units.push(NarrationUnit {
            role: field.role,
            text,
            stage: stages.len() - 1,
        });
    }

    NarrationPlan { stages, units }
}

fn remaining_options(record: &Record, first: FieldRole) -> Vec<TextBlock> {
    let FieldRole::Option(first_letter) = first else {
        return Vec::new();
    };
    record
        .fields()
        .into_iter()
        .filter(|f| matches!(f.role, FieldRole::Option(l) if l > first_letter))
        .map(|f| TextBlock {
            role: f.role,
            text: f.display_text(),
        })
        .collect()
}

fn plan_single(record: &Record) -> NarrationPlan {
    let blocks: Vec<TextBlock> = record
        .fields()
        .into_iter()
        .map(|f| TextBlock {
            role: f.role,
            text: f.display_text(),
        })
        .collect();

    let text = blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    NarrationPlan {
        stages: vec![RevealStage {
            kind: StageKind::Full,
            blocks,
        }],
        units: vec![NarrationUnit {
            role: FieldRole::Question,
            text,
            stage: 0,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;

    fn full_record() -> Record {
        Record::new(
            RecordId::new("quiz", 1),
            "What is the capital of France?",
            [
                Some("London".into()),
                Some("Paris".into()),
                Some("Berlin".into()),
                Some("Madrid".into()),
            ],
            Some("Paris".into()),
            Some("Paris has been the capital since 508 AD.".into()),
        )
        .unwrap()
    }

    #[test]
    fn question_only_record_has_one_stage_and_one_unit() {
        let record = Record::new(RecordId::new("quiz", 1), "Why?", Default::default(), None, None)
            .unwrap();
        let plan = plan(&record, RevealMode::Progressive);

        assert_eq!(plan.stages.len(), 1);
        assert_eq!(plan.stages[0].kind, StageKind::Question);
        assert_eq!(plan.stages[0].blocks.len(), 1);
        assert_eq!(plan.units.len(), 1);
        assert_eq!(plan.units[0].stage, 0);
    }

    #[test]
    fn full_record_units_follow_field_order() {
        let plan = plan(&full_record(), RevealMode::Progressive);

        let roles: Vec<FieldRole> = plan.units.iter().map(|u| u.role).collect();
        assert_eq!(
            roles,
            vec![
                FieldRole::Question,
                FieldRole::Option('A'),
                FieldRole::Option('B'),
                FieldRole::Option('C'),
                FieldRole::Option('D'),
                FieldRole::Answer,
                FieldRole::Explanation,
            ]
        );

        let kinds: Vec<StageKind> = plan.stages.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StageKind::Question,
                StageKind::Options,
                StageKind::Answer,
                StageKind::Explanation
            ]
        );

        // All four options narrate over the same frame.
        let option_stages: Vec<usize> = plan.units[1..5].iter().map(|u| u.stage).collect();
        assert_eq!(option_stages, vec![1, 1, 1, 1]);
        assert_eq!(plan.stages[1].blocks.len(), 5);
    }

    #[test]
    fn stages_are_cumulative() {
        let plan = plan(&full_record(), RevealMode::Progressive);
        for pair in plan.stages.windows(2) {
            assert!(pair[1].blocks.starts_with(&pair[0].blocks));
            assert!(pair[1].blocks.len() > pair[0].blocks.len());
        }
        assert_eq!(plan.stages[3].blocks[6].text, "Paris has been the capital since 508 AD.");
    }

    #[test]
    fn missing_explanation_drops_final_stage() {
        let mut record = full_record();
        record.explanation = None;
        let plan = plan(&record, RevealMode::Progressive);

        assert_eq!(plan.stages.len(), 3);
        assert_eq!(plan.units.len(), 6);
        assert_eq!(plan.units.last().unwrap().role, FieldRole::Answer);
    }

    #[test]
    fn single_mode_narrates_everything_once() {
        let plan = plan(&full_record(), RevealMode::Single);

        assert_eq!(plan.stages.len(), 1);
        assert_eq!(plan.stages[0].kind, StageKind::Full);
        assert_eq!(plan.units.len(), 1);
        assert!(plan.units[0].text.starts_with("What is the capital of France?\nA. London"));
        assert!(plan.units[0].text.ends_with("since 508 AD."));
    }
}
