use crate::model::Candidate;

/// Outcome of truncating the ranked candidate list to slot capacity.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    pub winners: Vec<Candidate>,
    /// Ranked past capacity; each lost as `outbid`.
    pub losers: Vec<Candidate>,
}

/// Concatenate tiers in fixed precedence and keep the first
/// `max_display_count` as winners.
///
/// Precedence is `system ++ operational ++ fixed_daily ++ bidding`, so only
/// capacity left over by system and operational content is contested by
/// commercial demand.
pub fn select(
    system: Vec<Candidate>,
    operational: Vec<Candidate>,
    fixed_daily: Vec<Candidate>,
    bidding: Vec<Candidate>,
    max_display_count: u32,
) -> Selection {
    let mut ranked: Vec<Candidate> =
        Vec::with_capacity(system.len() + operational.len() + fixed_daily.len() + bidding.len());
    ranked.extend(system);
    ranked.extend(operational);
    ranked.extend(fixed_daily);
    ranked.extend(bidding);

    let cap = (max_display_count as usize).min(ranked.len());
    let losers = ranked.split_off(cap);

    Selection {
        winners: ranked,
        losers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;

    fn ids(v: &[Candidate]) -> Vec<u64> {
        v.iter().map(|c| c.campaign_id()).collect()
    }

    #[test]
    fn precedence_beats_price() {
        let sel = select(
            vec![system(1, 10)],
            vec![operational(2, 5), operational(3, 3)],
            vec![],
            vec![bidding(4, 100)],
            2,
        );
        assert_eq!(ids(&sel.winners), vec![1, 2]);
        assert_eq!(ids(&sel.losers), vec![3, 4]);
    }

    #[test]
    fn fixed_daily_precedes_bidding() {
        let sel = select(vec![], vec![], vec![fixed(1)], vec![bidding(2, 1_000)], 1);
        assert_eq!(ids(&sel.winners), vec![1]);
        assert_eq!(ids(&sel.losers), vec![2]);
    }

    #[test]
    fn zero_capacity_loses_everything() {
        let sel = select(vec![system(1, 1)], vec![], vec![fixed(2)], vec![], 0);
        assert!(sel.winners.is_empty());
        assert_eq!(ids(&sel.losers), vec![1, 2]);
    }

    #[test]
    fn capacity_above_candidate_count_keeps_all() {
        let sel = select(vec![], vec![operational(1, 1)], vec![], vec![bidding(2, 3)], 10);
        assert_eq!(ids(&sel.winners), vec![1, 2]);
        assert!(sel.losers.is_empty());
    }

    #[test]
    fn empty_input_is_empty_selection() {
        let sel = select(vec![], vec![], vec![], vec![], 3);
        assert!(sel.winners.is_empty());
        assert!(sel.losers.is_empty());
    }
}
