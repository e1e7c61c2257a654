use taskforge_types::{Conflict, ConflictType, ResourceAction, RiskLevel};

/// Classify how two actions on a shared resource interfere.
///
/// `mine` is the action of the task being checked, `other` the action held
/// by another unfinished task. Read/read access never conflicts; a reader
/// next to a writer is a collision worth flagging; two writers are always
/// high severity.
pub fn classify_actions(
    mine: ResourceAction,
    other: ResourceAction,
) -> Option<(ConflictType, RiskLevel)> {
    use ResourceAction::*;
    match (mine, other) {
        (Modifies, Modifies) => Some((ConflictType::ConcurrentModify, RiskLevel::High)),
        (Creates, Creates) => Some((ConflictType::ConcurrentWrite, RiskLevel::High)),
        (Modifies, Creates) | (Creates, Modifies) => {
            Some((ConflictType::ConcurrentWrite, RiskLevel::High))
        }
        (Uses, Modifies) | (Modifies, Uses) => {
            Some((ConflictType::PotentialCollision, RiskLevel::Medium))
        }
        (Uses, Uses) | (Uses, Creates) | (Creates, Uses) => None,
    }
}

/// Build the full conflict record for one classified pair.
pub fn build_conflict(
    other_task_id: &str,
    other_task_title: &str,
    resource_id: &str,
    resource_name: &str,
    mine: ResourceAction,
    other: ResourceAction,
) -> Option<Conflict> {
    let (conflict_type, severity) = classify_actions(mine, other)?;
    let description = format!(
        "This task {} '{}' while task '{}' {} it",
        mine.as_str(),
        resource_name,
        other_task_title,
        other.as_str()
    );
    Some(Conflict {
        task_id: other_task_id.to_string(),
        task_title: other_task_title.to_string(),
        resource_id: resource_id.to_string(),
        resource_name: resource_name.to_string(),
        conflict_type,
        severity,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResourceAction::*;

    #[test]
    fn test_concurrent_modify_is_high() {
        assert_eq!(
            classify_actions(Modifies, Modifies),
            Some((ConflictType::ConcurrentModify, RiskLevel::High))
        );
    }

    #[test]
    fn test_writer_pairs_are_concurrent_write() {
        for (a, b) in [(Creates, Creates), (Modifies, Creates), (Creates, Modifies)] {
            assert_eq!(
                classify_actions(a, b),
                Some((ConflictType::ConcurrentWrite, RiskLevel::High))
            );
        }
    }

    #[test]
    fn test_reader_beside_writer_is_medium() {
        assert_eq!(
            classify_actions(Uses, Modifies),
            Some((ConflictType::PotentialCollision, RiskLevel::Medium))
        );
        assert_eq!(
            classify_actions(Modifies, Uses),
            Some((ConflictType::PotentialCollision, RiskLevel::Medium))
        );
    }

    #[test]
    fn test_shared_reads_do_not_conflict() {
        assert_eq!(classify_actions(Uses, Uses), None);
    }

    #[test]
    fn test_build_conflict_description() {
        let conflict = build_conflict("t2", "Refactor auth", "r1", "auth.ts", Modifies, Modifies)
            .expect("conflict");
        assert_eq!(conflict.conflict_type, ConflictType::ConcurrentModify);
        assert!(conflict.description.contains("auth.ts"));
        assert!(conflict.description.contains("Refactor auth"));
    }
}
