//! Plain-text rendering for CLI output

use rust_decimal::Decimal;

use crate::domain::{
    LeaderboardEntry, LeagueId, LeagueMember, LeagueSummary, MemberStanding, PortfolioValuation,
    UserId,
};

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn opt_money(value: Option<Decimal>) -> String {
    value.map(money).unwrap_or_else(|| "-".to_string())
}

fn percent(value: Decimal) -> String {
    format!("{:.2}%", value)
}

/// Ranked table, degraded members shown with their failure reason
pub fn leaderboard_table(league_id: LeagueId, entries: &[LeaderboardEntry]) -> String {
    let mut lines = vec![
        format!("Leaderboard - league {}", league_id),
        format!(
            "{:>4}  {:<20} {:>14} {:>14} {:>9}",
            "RANK", "USER", "TOTAL", "PNL", "RETURN"
        ),
    ];

    if entries.is_empty() {
        lines.push("  (no members)".to_string());
    }

    for entry in entries {
        let line = match &entry.standing {
            MemberStanding::Valued(v) => format!(
                "{:>4}  {:<20} {:>14} {:>14} {:>9}{}",
                entry.rank,
                entry.username,
                money(v.total_asset),
                money(v.pnl),
                percent(v.return_pct),
                if v.is_partial() { "  (partial)" } else { "" }
            ),
            MemberStanding::Degraded { reason } => format!(
                "{:>4}  {:<20} {:>14} {:>14} {:>9}  unavailable: {}",
                entry.rank, entry.username, "-", "-", "-", reason
            ),
        };
        lines.push(line);
    }

    lines.join("\n")
}

/// Account summary followed by one row per holding
pub fn valuation_report(valuation: &PortfolioValuation) -> String {
    let mut lines = vec![
        format!("Portfolio - {}", valuation.account),
        format!("  Starting cash:  {}", money(valuation.starting_cash)),
        format!("  Cash:           {}", money(valuation.cash)),
        format!("  Holdings value: {}", money(valuation.holdings_value)),
        format!("  Total asset:    {}", money(valuation.total_asset)),
        format!(
            "  PNL:            {} ({})",
            money(valuation.pnl),
            percent(valuation.return_pct)
        ),
    ];

    if !valuation.holdings.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "  {:<8} {:>10} {:>12} {:>12} {:>14} {:>12}",
            "SYMBOL", "QTY", "AVG COST", "PRICE", "VALUE", "PNL"
        ));
        for h in &valuation.holdings {
            lines.push(format!(
                "  {:<8} {:>10} {:>12} {:>12} {:>14} {:>12}",
                h.symbol,
                h.quantity.normalize().to_string(),
                money(h.average_cost),
                opt_money(h.current_price),
                opt_money(h.market_value),
                opt_money(h.pnl)
            ));
        }
    }

    if valuation.is_partial() {
        lines.push(String::new());
        lines.push(format!(
            "  No quote for: {}",
            valuation.missing_quotes.join(", ")
        ));
    }

    lines.join("\n")
}

pub fn members_list(league_id: LeagueId, members: &[LeagueMember]) -> String {
    let mut lines = vec![format!("Members - league {} ({})", league_id, members.len())];
    lines.extend(
        members
            .iter()
            .map(|m| format!("  {:>8}  {}", m.user_id, m.username)),
    );
    lines.join("\n")
}

/// One row per league the user joined, newest first
pub fn history_table(user_id: UserId, history: &[LeagueSummary]) -> String {
    let mut lines = vec![
        format!("League history - user {}", user_id),
        format!(
            "{:>6}  {:<20} {:<7} {:>7} {:>14} {:>14} {:>9} {:>5}",
            "LEAGUE", "NAME", "STATUS", "PLAYERS", "INITIAL", "FINAL", "RETURN", "RANK"
        ),
    ];

    if history.is_empty() {
        lines.push("  (no leagues)".to_string());
    }

    for league in history {
        lines.push(format!(
            "{:>6}  {:<20} {:<7} {:>7} {:>14} {:>14} {:>9} {:>5}",
            league.league_id,
            league.name,
            league.status.to_string(),
            league.participant_count,
            money(league.initial_asset),
            opt_money(league.final_asset),
            league.return_pct.map(percent).unwrap_or_else(|| "-".to_string()),
            league
                .rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string())
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        rank_standings, valuate_account, Account, AccountId, Holding, LeagueStatus,
    };
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn valued(user_id: u64, cash: Decimal) -> (LeagueMember, MemberStanding) {
        let account =
            Account::with_state(AccountId::new(user_id, 1), dec!(1000), cash, vec![]).unwrap();
        let valuation = valuate_account(&account, &HashMap::new()).unwrap();
        (
            LeagueMember::new(user_id, format!("user{}", user_id)),
            MemberStanding::Valued(valuation),
        )
    }

    #[test]
    fn test_leaderboard_table_rows() {
        let entries = rank_standings(vec![
            valued(1, dec!(900)),
            valued(2, dec!(1100)),
            (
                LeagueMember::new(3, "user3"),
                MemberStanding::Degraded {
                    reason: "timed out".to_string(),
                },
            ),
        ]);

        let table = leaderboard_table(1, &entries);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].contains("user2") && lines[2].contains("10.00%"));
        assert!(lines[3].contains("user1") && lines[3].contains("-10.00%"));
        assert!(lines[4].contains("unavailable: timed out"));
    }

    #[test]
    fn test_empty_leaderboard() {
        assert!(leaderboard_table(9, &[]).contains("(no members)"));
    }

    #[test]
    fn test_valuation_report_marks_missing_quotes() {
        let account = Account::with_state(
            AccountId::new(7, 1),
            dec!(1000),
            dec!(500),
            vec![Holding::new("AAPL", dec!(5), dec!(100)).unwrap()],
        )
        .unwrap();
        let report = valuation_report(&valuate_account(&account, &HashMap::new()).unwrap());

        assert!(report.contains("Total asset:    500.00"));
        assert!(report.contains("No quote for: AAPL"));
    }

    #[test]
    fn test_members_list() {
        let members = [LeagueMember::new(7, "alice"), LeagueMember::new(8, "bob")];
        let list = members_list(1, &members);
        assert!(list.starts_with("Members - league 1 (2)"));
        assert!(list.contains("alice"));
    }

    #[test]
    fn test_history_table_shows_rank_of_degraded_league() {
        let history = vec![
            LeagueSummary {
                league_id: 2,
                name: "Spring Cup".to_string(),
                status: LeagueStatus::Active,
                participant_count: 3,
                initial_asset: dec!(10000),
                final_asset: None,
                return_pct: None,
                rank: Some(3),
            },
            LeagueSummary {
                league_id: 1,
                name: "Winter Cup".to_string(),
                status: LeagueStatus::Ended,
                participant_count: 2,
                initial_asset: dec!(10000),
                final_asset: Some(dec!(10500)),
                return_pct: Some(dec!(5.00)),
                rank: Some(1),
            },
        ];

        let table = history_table(7, &history);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("ACTIVE") && lines[2].trim_end().ends_with('3'));
        assert!(lines[3].contains("10500.00") && lines[3].contains("5.00%"));
        assert!(history_table(7, &[]).contains("(no leagues)"));
    }
}
