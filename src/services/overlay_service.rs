use crate::{
    dto::judging::{ActiveOverlay, OverlayCard, OverlayPayload, StateMeta},
    error::ServiceError,
    judge::view::escape_html,
    state::{
        SharedState,
        judging::{CardWinner, JudgedMatch, RobotProfile, compute_match_summary},
    },
};

/// Current match for the broadcast overlay, or `empty` when nothing is being judged.
pub async fn overlay(state: &SharedState) -> OverlayPayload {
    let judging = state.judging().read().await;
    let meta = StateMeta::from(&*judging);
    let Some(judged) = judging.current.as_ref() else {
        return OverlayPayload::Empty { meta };
    };

    let summary = compute_match_summary(judged, state.config().judge_count());
    let profile = |name: &str| {
        state
            .robot(&judged.weight_class, name)
            .map(|entry| entry.profile)
            .unwrap_or_else(|| RobotProfile::named(name))
    };

    OverlayPayload::Active(Box::new(ActiveOverlay {
        match_id: judged.match_id.clone(),
        weight_class: judged.weight_class.clone(),
        headline: summary.headline,
        winner: summary.winner,
        winner_name: summary.winner_name,
        decision: summary.decision,
        counts: summary.counts,
        is_complete: summary.is_complete,
        pending_judges: summary.pending_judges,
        red: profile(&judged.red),
        white: profile(&judged.white),
        judges: summary.judge_cards.iter().map(OverlayCard::from).collect(),
        meta,
    }))
}

/// Robot card HTML fragment with the robot's finished judged matches.
pub async fn robot_card(
    state: &SharedState,
    weight_class: &str,
    name: &str,
) -> Result<String, ServiceError> {
    let Some(entry) = state.robot(weight_class, name) else {
        return Err(ServiceError::NotFound("Not found".into()));
    };
    let judging = state.judging().read().await;
    let record = judging
        .history
        .iter()
        .filter(|judged| same_class(judged, &entry.weight_class))
        .filter_map(|judged| outcome_for(judged, &entry.profile.name, state.config().judge_count()))
        .fold(Record::default(), Record::add);

    let profile = &entry.profile;
    let elo = profile
        .elo
        .map(|elo| elo.to_string())
        .unwrap_or_else(|| "—".into());
    Ok(format!(
        "<div class='robot-card'><h3>{}</h3><p class='small'>{}</p>\
         <p>Driver: {}</p><p>Team: {}</p><p>ELO: {}</p>\
         <p class='record'>{}W {}L {}D</p></div>",
        escape_html(&profile.name),
        escape_html(&entry.weight_class),
        escape_html(&profile.driver),
        escape_html(&profile.team),
        elo,
        record.wins,
        record.losses,
        record.draws,
    ))
}

#[derive(Debug, Clone, Copy)]
enum Bout {
    Won,
    Lost,
    Drawn,
}

#[derive(Debug, Default)]
struct Record {
    wins: u32,
    losses: u32,
    draws: u32,
}

impl Record {
    fn add(mut self, bout: Bout) -> Self {
        match bout {
            Bout::Won => self.wins += 1,
            Bout::Lost => self.losses += 1,
            Bout::Drawn => self.draws += 1,
        }
        self
    }
}

fn same_class(judged: &JudgedMatch, weight_class: &str) -> bool {
    judged.weight_class.trim().eq_ignore_ascii_case(weight_class.trim())
}

/// How `judged` went for `name`, if the robot fought in it.
fn outcome_for(judged: &JudgedMatch, name: &str, judge_count: u32) -> Option<Bout> {
    let is_red = judged.red.eq_ignore_ascii_case(name);
    if !is_red && !judged.white.eq_ignore_ascii_case(name) {
        return None;
    }
    let bout = match (compute_match_summary(judged, judge_count).winner, is_red) {
        (CardWinner::Draw, _) => Bout::Drawn,
        (CardWinner::Red, true) | (CardWinner::White, false) => Bout::Won,
        _ => Bout::Lost,
    };
    Some(bout)
}
