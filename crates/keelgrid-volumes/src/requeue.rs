//! Queueing hints — when is a rejected pod worth retrying?
//!
//! A pod rejected by this filter waits until a cluster event could
//! plausibly flip the decision. The hints here are deliberately
//! conservative: they answer "could this event possibly help" from the
//! event payload alone, without re-running the full filter. Pod update
//! events are not registered because volume declarations are immutable.

use std::collections::HashSet;

use tracing::debug;

use keelgrid_sched::{
    ClusterEvent, ClusterEventKind, EnqueuePlugin, EventInterest, QueueingHint, SchedError,
    SchedResult,
};
use keelgrid_state::{NodeInfo, Pod};

use crate::conflict::satisfies_volume_conflicts;
use crate::filter::VolumeRestrictions;

impl VolumeRestrictions {
    /// Hint for a pod-deletion event: does the departure of `deleted`
    /// possibly free a volume or exclusive claim this pod is waiting on?
    pub fn hint_after_pod_deleted(
        &self,
        pod: &Pod,
        event: &ClusterEvent,
    ) -> SchedResult<QueueingHint> {
        let ClusterEvent::PodDeleted { pod: deleted } = event else {
            return Err(SchedError::UnexpectedEvent(format!(
                "pod-deleted hint received a {:?} event",
                event.kind()
            )));
        };

        if deleted.namespace != pod.namespace {
            return Ok(QueueingHint::Skip);
        }

        let pod_claims = match self.exclusive_claims_for_pod(pod, false) {
            Ok(claims) => claims,
            Err(err) if err.is_claim_not_found() => {
                debug!(
                    pod = %pod.key(),
                    %err,
                    "referenced claim not created yet, pod stays pending"
                );
                return Ok(QueueingHint::Skip);
            }
            Err(err) => return Err(err),
        };

        // The deleted pod may have referenced claims that were deleted with
        // it. Those can be ignored either way: a new pod naming such a
        // claim stays pending until the claim is recreated, and a pod that
        // doesn't is unrelated to it. The claims that still exist are the
        // ones whose release could matter, so resolve best-effort.
        let deleted_claims = self.exclusive_claims_for_pod(deleted, true)?;

        // Any shared exclusive claim means the deletion may have freed a
        // claim this pod needs. Requeue on overlap rather than re-deriving
        // exact conflict state, which would amount to a full filter pass.
        if deleted_claims.iter().any(|c| pod_claims.contains(c)) {
            debug!(
                pod = %pod.key(),
                deleted = %deleted.key(),
                "deleted pod held a shared exclusive claim"
            );
            return Ok(QueueingHint::Queue);
        }

        // Replay the deleted pod's volumes as if still mounted: a conflict
        // against them means the deletion may have opened up its node.
        let replay = NodeInfo::with_pod(deleted.clone());
        if !satisfies_volume_conflicts(pod, &replay) {
            debug!(
                pod = %pod.key(),
                deleted = %deleted.key(),
                "deleted pod's volumes conflicted with this pod"
            );
            return Ok(QueueingHint::Queue);
        }

        Ok(QueueingHint::Skip)
    }

    /// Hint for a claim-change event: only a *creation* in the pod's
    /// namespace of a claim the pod references can help, since a missing
    /// claim is the only condition a claim event resolves.
    pub fn hint_after_claim_change(
        &self,
        pod: &Pod,
        event: &ClusterEvent,
    ) -> SchedResult<QueueingHint> {
        let ClusterEvent::ClaimChanged { old, new } = event else {
            return Err(SchedError::UnexpectedEvent(format!(
                "claim-change hint received a {:?} event",
                event.kind()
            )));
        };

        // An update cannot resolve a claim-does-not-exist-yet condition.
        if old.is_some() || new.namespace != pod.namespace {
            return Ok(QueueingHint::Skip);
        }

        let mut referenced = HashSet::new();
        for claim_name in pod.spec.claim_names() {
            match self.claims().get(&pod.namespace, claim_name) {
                Ok(claim) => {
                    referenced.insert(claim.name);
                }
                Err(err) if err.is_not_found() => {
                    debug!(
                        pod = %pod.key(),
                        claim = claim_name,
                        "referenced claim not created yet, pod stays pending"
                    );
                    return Ok(QueueingHint::Skip);
                }
                Err(err) => return Err(err.into()),
            }
        }

        if referenced.contains(&new.name) {
            return Ok(QueueingHint::Queue);
        }
        Ok(QueueingHint::Skip)
    }
}

impl EnqueuePlugin for VolumeRestrictions {
    fn event_interests(&self) -> Vec<EventInterest> {
        vec![
            // Deleting a running pod can release volumes or an exclusive
            // claim the blocked pod is waiting on.
            EventInterest::hinted(ClusterEventKind::PodDeleted),
            // Any new node could admit the pod; no refinement computed.
            EventInterest::unhinted(ClusterEventKind::NodeAdded),
            // A pod may be blocked on a claim that does not exist yet; the
            // claim must exist before its access modes can be checked.
            EventInterest::hinted(ClusterEventKind::ClaimAdded),
            EventInterest::hinted(ClusterEventKind::ClaimUpdated),
        ]
    }

    fn queueing_hint(&self, pod: &Pod, event: &ClusterEvent) -> SchedResult<QueueingHint> {
        match event {
            ClusterEvent::PodDeleted { .. } => self.hint_after_pod_deleted(pod, event),
            ClusterEvent::ClaimChanged { .. } => self.hint_after_claim_change(pod, event),
            ClusterEvent::NodeAdded { .. } => Err(SchedError::UnexpectedEvent(format!(
                "no hint registered for {:?} events",
                event.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use keelgrid_state::{
        AccessMode, Claim, InMemoryClaimStore, PodSpec, Snapshot, Volume, VolumeSource,
    };

    fn make_pod(ns: &str, name: &str, sources: Vec<VolumeSource>) -> Pod {
        Pod {
            name: name.to_string(),
            namespace: ns.to_string(),
            node_name: None,
            spec: PodSpec {
                volumes: sources
                    .into_iter()
                    .enumerate()
                    .map(|(i, source)| Volume {
                        name: format!("vol-{i}"),
                        source,
                    })
                    .collect(),
            },
        }
    }

    fn claim_source(name: &str) -> VolumeSource {
        VolumeSource::Claim {
            claim_name: name.to_string(),
        }
    }

    fn exclusive_claim(ns: &str, name: &str) -> Claim {
        Claim {
            name: name.to_string(),
            namespace: ns.to_string(),
            access_modes: vec![AccessMode::Exclusive],
        }
    }

    fn plugin_with(claims: Vec<Claim>) -> (VolumeRestrictions, Arc<InMemoryClaimStore>) {
        let store = Arc::new(InMemoryClaimStore::new());
        for claim in claims {
            store.insert(claim);
        }
        let plugin = VolumeRestrictions::new(store.clone(), Arc::new(Snapshot::default()));
        (plugin, store)
    }

    fn deleted(pod: Pod) -> ClusterEvent {
        ClusterEvent::PodDeleted { pod }
    }

    #[test]
    fn deletion_of_claim_holder_requeues() {
        let (plugin, _) = plugin_with(vec![exclusive_claim("prod", "db")]);

        let pod = make_pod("prod", "blocked", vec![claim_source("db")]);
        let mut holder = make_pod("prod", "holder", vec![claim_source("db")]);
        holder.node_name = Some("n1".to_string());

        let hint = plugin.hint_after_pod_deleted(&pod, &deleted(holder)).unwrap();
        assert_eq!(hint, QueueingHint::Queue);
    }

    #[test]
    fn deletion_in_other_namespace_skips() {
        let (plugin, _) = plugin_with(vec![exclusive_claim("prod", "db")]);

        let pod = make_pod("prod", "blocked", vec![claim_source("db")]);
        let foreign = make_pod("staging", "holder", vec![claim_source("db")]);

        let hint = plugin.hint_after_pod_deleted(&pod, &deleted(foreign)).unwrap();
        assert_eq!(hint, QueueingHint::Skip);
    }

    #[test]
    fn deletion_with_missing_own_claim_skips() {
        let (plugin, _) = plugin_with(vec![]);

        let pod = make_pod("prod", "blocked", vec![claim_source("not-yet")]);
        let other = make_pod("prod", "gone", vec![]);

        let hint = plugin.hint_after_pod_deleted(&pod, &deleted(other)).unwrap();
        assert_eq!(hint, QueueingHint::Skip);
    }

    #[test]
    fn deleted_pods_stale_claim_reference_is_ignored() {
        // The deleted pod references a claim that no longer exists; the
        // hint must not fail on it.
        let (plugin, _) = plugin_with(vec![exclusive_claim("prod", "db")]);

        let pod = make_pod("prod", "blocked", vec![claim_source("db")]);
        let gone = make_pod("prod", "gone", vec![claim_source("deleted-claim")]);

        let hint = plugin.hint_after_pod_deleted(&pod, &deleted(gone)).unwrap();
        assert_eq!(hint, QueueingHint::Skip);
    }

    #[test]
    fn deletion_of_volume_conflicter_requeues() {
        let (plugin, _) = plugin_with(vec![]);

        let source = VolumeSource::BlockDisk {
            disk_name: "disk-a".to_string(),
            read_only: false,
        };
        let pod = make_pod("prod", "blocked", vec![source.clone()]);
        let conflicter = make_pod("prod", "gone", vec![source]);

        let hint = plugin
            .hint_after_pod_deleted(&pod, &deleted(conflicter))
            .unwrap();
        assert_eq!(hint, QueueingHint::Queue);
    }

    #[test]
    fn unrelated_deletion_skips() {
        let (plugin, _) = plugin_with(vec![]);

        let pod = make_pod(
            "prod",
            "blocked",
            vec![VolumeSource::BlockDisk {
                disk_name: "disk-a".to_string(),
                read_only: false,
            }],
        );
        let unrelated = make_pod(
            "prod",
            "gone",
            vec![VolumeSource::BlockDisk {
                disk_name: "disk-b".to_string(),
                read_only: false,
            }],
        );

        let hint = plugin
            .hint_after_pod_deleted(&pod, &deleted(unrelated))
            .unwrap();
        assert_eq!(hint, QueueingHint::Skip);
    }

    #[test]
    fn claim_creation_for_referenced_name_requeues() {
        let (plugin, store) = plugin_with(vec![]);

        let pod = make_pod("prod", "blocked", vec![claim_source("c2")]);

        // The informer delivers the event after the store sees the claim.
        let created = exclusive_claim("prod", "c2");
        store.insert(created.clone());

        let hint = plugin
            .hint_after_claim_change(
                &pod,
                &ClusterEvent::ClaimChanged {
                    old: None,
                    new: created,
                },
            )
            .unwrap();
        assert_eq!(hint, QueueingHint::Queue);
    }

    #[test]
    fn claim_update_skips() {
        let (plugin, _) = plugin_with(vec![exclusive_claim("prod", "c2")]);

        let pod = make_pod("prod", "blocked", vec![claim_source("c2")]);
        let hint = plugin
            .hint_after_claim_change(
                &pod,
                &ClusterEvent::ClaimChanged {
                    old: Some(exclusive_claim("prod", "c2")),
                    new: exclusive_claim("prod", "c2"),
                },
            )
            .unwrap();
        assert_eq!(hint, QueueingHint::Skip);
    }

    #[test]
    fn claim_creation_in_other_namespace_skips() {
        let (plugin, store) = plugin_with(vec![exclusive_claim("prod", "c2")]);
        store.insert(exclusive_claim("staging", "c2"));

        let pod = make_pod("prod", "blocked", vec![claim_source("c2")]);
        let hint = plugin
            .hint_after_claim_change(
                &pod,
                &ClusterEvent::ClaimChanged {
                    old: None,
                    new: exclusive_claim("staging", "c2"),
                },
            )
            .unwrap();
        assert_eq!(hint, QueueingHint::Skip);
    }

    #[test]
    fn claim_creation_of_unreferenced_name_skips() {
        let (plugin, store) = plugin_with(vec![exclusive_claim("prod", "c2")]);
        store.insert(exclusive_claim("prod", "other"));

        let pod = make_pod("prod", "blocked", vec![claim_source("c2")]);
        let hint = plugin
            .hint_after_claim_change(
                &pod,
                &ClusterEvent::ClaimChanged {
                    old: None,
                    new: exclusive_claim("prod", "other"),
                },
            )
            .unwrap();
        assert_eq!(hint, QueueingHint::Skip);
    }

    #[test]
    fn mismatched_event_payload_fails_loudly() {
        let (plugin, _) = plugin_with(vec![]);
        let pod = make_pod("prod", "blocked", vec![]);
        let node_event = ClusterEvent::NodeAdded {
            node_id: "n1".to_string(),
        };

        let err = plugin.hint_after_pod_deleted(&pod, &node_event).unwrap_err();
        assert!(matches!(err, SchedError::UnexpectedEvent(_)));

        let err = plugin.queueing_hint(&pod, &node_event).unwrap_err();
        assert!(matches!(err, SchedError::UnexpectedEvent(_)));
    }

    #[test]
    fn interests_cover_release_and_creation_events() {
        let (plugin, _) = plugin_with(vec![]);
        let interests = plugin.event_interests();

        let hinted: Vec<_> = interests.iter().filter(|i| i.hinted).map(|i| i.kind).collect();
        assert!(hinted.contains(&ClusterEventKind::PodDeleted));
        assert!(hinted.contains(&ClusterEventKind::ClaimAdded));
        assert!(hinted.contains(&ClusterEventKind::ClaimUpdated));

        assert!(interests
            .iter()
            .any(|i| i.kind == ClusterEventKind::NodeAdded && !i.hinted));
    }

    #[test]
    fn queueing_hint_dispatches_by_event() {
        let (plugin, store) = plugin_with(vec![exclusive_claim("prod", "db")]);
        store.insert(exclusive_claim("prod", "c2"));

        let pod = make_pod("prod", "blocked", vec![claim_source("db")]);
        let mut holder = make_pod("prod", "holder", vec![claim_source("db")]);
        holder.node_name = Some("n1".to_string());

        assert_eq!(
            plugin.queueing_hint(&pod, &deleted(holder)).unwrap(),
            QueueingHint::Queue
        );
        assert_eq!(
            plugin
                .queueing_hint(
                    &pod,
                    &ClusterEvent::ClaimChanged {
                        old: None,
                        new: exclusive_claim("prod", "c2"),
                    }
                )
                .unwrap(),
            QueueingHint::Skip
        );
    }
}
