//! Chain resolution: profile reference → flat hop list, outermost last.

use sb_profile::{Group, ProfileBean, ProfileStore, ProxyProfile};
use sb_types::BuildError;
use std::sync::Arc;

/// Expand one profile.
///
/// A chain's members are stored innermost-first and come back in reverse;
/// a missing member or a nested chain aborts resolution.
pub fn resolve_profile(
    store: &dyn ProfileStore,
    profile: &Arc<ProxyProfile>,
) -> Result<Vec<Arc<ProxyProfile>>, BuildError> {
    let ProfileBean::Chain(chain) = &profile.bean else {
        return Ok(vec![Arc::clone(profile)]);
    };
    chain
        .list
        .iter()
        .rev()
        .map(|id| {
            let member = store.profile(*id).ok_or(BuildError::ChainMissing(*id))?;
            if member.is_chain() {
                return Err(BuildError::NestedChain(*id));
            }
            Ok(member)
        })
        .collect()
}

/// Expand `profile` and append the group's front proxy expansion, if any.
pub fn resolve_chain(
    store: &dyn ProfileStore,
    profile: &Arc<ProxyProfile>,
    group: &Group,
) -> Result<Vec<Arc<ProxyProfile>>, BuildError> {
    let mut hops = resolve_profile(store, profile)?;
    if let Some(front_id) = group.front_proxy_id {
        let front = store
            .profile(front_id)
            .ok_or(BuildError::FrontProxyMissing(front_id))?;
        hops.extend(resolve_profile(store, &front)?);
    }
    Ok(hops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_profile::{ChainBean, MemoryStore, SocksHttpBean};

    fn socks(id: i64) -> ProxyProfile {
        ProxyProfile::new(id, 0, ProfileBean::Socks(SocksHttpBean::default()))
    }

    fn chain(id: i64, list: &[i64]) -> ProxyProfile {
        ProxyProfile::new(
            id,
            0,
            ProfileBean::Chain(ChainBean {
                list: list.to_vec(),
            }),
        )
    }

    fn ids(v: &[Arc<ProxyProfile>]) -> Vec<i64> {
        v.iter().map(|p| p.id).collect()
    }

    fn store(profiles: Vec<ProxyProfile>) -> MemoryStore {
        MemoryStore::from_parts(profiles, [Group::default()]).unwrap()
    }

    #[test]
    fn non_chain_is_singleton() {
        let s = store(vec![socks(1)]);
        let p = s.profile(1).unwrap();
        assert_eq!(ids(&resolve_chain(&s, &p, &Group::default()).unwrap()), vec![1]);
    }

    #[test]
    fn chain_members_reversed() {
        let s = store(vec![socks(1), socks(2), socks(3), chain(10, &[1, 2, 3])]);
        let p = s.profile(10).unwrap();
        assert_eq!(ids(&resolve_profile(&s, &p).unwrap()), vec![3, 2, 1]);
    }

    #[test]
    fn missing_member_named() {
        let s = store(vec![socks(1), chain(10, &[1, 42])]);
        let p = s.profile(10).unwrap();
        let err = resolve_profile(&s, &p).unwrap_err();
        assert_eq!(err, BuildError::ChainMissing(42));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn nested_chain_rejected() {
        let s = store(vec![socks(1), chain(10, &[1]), chain(11, &[1, 10])]);
        let p = s.profile(11).unwrap();
        assert_eq!(resolve_profile(&s, &p), Err(BuildError::NestedChain(10)));
    }

    #[test]
    fn front_proxy_appended_outermost() {
        let s = store(vec![socks(1), socks(2), socks(7), chain(10, &[1, 2])]);
        let g = Group {
            front_proxy_id: Some(7),
            ..Default::default()
        };
        let p = s.profile(10).unwrap();
        assert_eq!(ids(&resolve_chain(&s, &p, &g).unwrap()), vec![2, 1, 7]);

        let p1 = s.profile(1).unwrap();
        assert_eq!(ids(&resolve_chain(&s, &p1, &g).unwrap()), vec![1, 7]);
    }

    #[test]
    fn missing_front_proxy() {
        let s = store(vec![socks(1)]);
        let g = Group {
            front_proxy_id: Some(99),
            ..Default::default()
        };
        let p = s.profile(1).unwrap();
        assert_eq!(
            resolve_chain(&s, &p, &g),
            Err(BuildError::FrontProxyMissing(99))
        );
    }
}
