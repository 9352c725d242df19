//! Live poll state and the poll panel that displays it.

use std::collections::BTreeSet;

use agora_shared::protocol::MAX_POLL_ANSWERS;

use super::{
    error::CommandError,
    value_object::AttendeeId,
    view::{PollControlsView, PollOptionView, PollView},
};

/// The running poll as last reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub question: String,
    pub answers: Vec<String>,
    pub voted: BTreeSet<AttendeeId>,
    pub tally: Vec<u32>,
}

impl Poll {
    /// Sum of all per-option counts.
    pub fn total_votes(&self) -> u32 {
        self.tally.iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct VoteButton {
    label: String,
    visible: bool,
    enabled: bool,
}

/// View state of the poll panel.
///
/// The panel remembers which poll it is showing: the question, the answer
/// buttons and the meter maximum are only populated when a poll is first
/// seen (the panel was hidden, or the question or answers changed), while
/// the tally and voter marks refresh on every update.
#[derive(Debug, Default)]
pub struct PollPanel {
    visible: bool,
    question: String,
    buttons: [VoteButton; MAX_POLL_ANSWERS],
    meter_value: u32,
    meter_max: usize,
    voted: BTreeSet<AttendeeId>,
    /// Option most recently voted for in this session
    selected: Option<usize>,
    /// Set between casting a vote and the next poll update
    awaiting_update: bool,
    administering: bool,
}

impl PollPanel {
    pub fn new(administering: bool) -> Self {
        Self {
            administering,
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Attendees that get a "voted" checkmark. Always empty for non-administrators.
    pub fn voted(&self) -> &BTreeSet<AttendeeId> {
        &self.voted
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Hide the panel and clear per-voter marks.
    pub fn hide(&mut self) {
        self.visible = false;
        self.voted.clear();
        self.awaiting_update = false;
    }

    /// Apply a poll update from the server.
    ///
    /// `attendee_count` becomes the meter maximum when the panel is shown for
    /// the first time.
    pub fn reconcile(&mut self, poll: &Poll, attendee_count: usize) {
        if !self.is_showing(poll) {
            self.question = poll.question.clone();
            for (index, button) in self.buttons.iter_mut().enumerate() {
                *button = match poll.answers.get(index) {
                    Some(label) => VoteButton {
                        label: label.clone(),
                        visible: true,
                        enabled: true,
                    },
                    None => VoteButton::default(),
                };
            }
            self.meter_value = 0;
            self.meter_max = attendee_count;
            self.selected = None;
            self.visible = true;
        } else {
            for (index, button) in self.buttons.iter_mut().enumerate() {
                button.enabled = button.visible && self.selected != Some(index);
            }
        }
        self.awaiting_update = false;

        if self.administering {
            self.voted = poll.voted.clone();
        }
        self.meter_value = poll.total_votes();
    }

    fn is_showing(&self, poll: &Poll) -> bool {
        let labels = self
            .buttons
            .iter()
            .filter(|button| button.visible)
            .map(|button| &button.label);
        self.visible && self.question == poll.question && labels.eq(poll.answers.iter())
    }

    /// Record a local vote: every button locks until the next update arrives.
    ///
    /// Returns the question text to send along with the vote.
    pub fn cast_vote(&mut self, index: usize) -> Result<String, CommandError> {
        if !self.visible {
            return Err(CommandError::NoActivePoll);
        }
        let button = self
            .buttons
            .get(index)
            .filter(|button| button.visible)
            .ok_or(CommandError::InvalidOption(index))?;
        if !button.enabled || self.awaiting_update {
            return Err(CommandError::VoteLocked(index));
        }

        for button in self.buttons.iter_mut() {
            button.enabled = false;
        }
        self.selected = Some(index);
        self.awaiting_update = true;

        Ok(self.question.clone())
    }

    /// "<total> of <max> votes cast"
    pub fn meter_caption(&self) -> String {
        format!("{} of {} votes cast", self.meter_value, self.meter_max)
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> PollView {
        PollView {
            visible: self.visible,
            question: self.question.clone(),
            options: self
                .buttons
                .iter()
                .enumerate()
                .filter(|(_, button)| button.visible)
                .map(|(index, button)| PollOptionView {
                    index,
                    label: button.label.clone(),
                    enabled: button.enabled,
                    selected: self.selected == Some(index),
                })
                .collect(),
            meter_value: self.meter_value,
            meter_max: self.meter_max,
            caption: self.meter_caption(),
            controls: self.administering.then_some(PollControlsView {
                new_poll_visible: !self.visible,
                abort_visible: self.visible,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(answers: &[&str], tally: &[u32], voted: &[i64]) -> Poll {
        Poll {
            question: "Where to eat?".to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            voted: voted.iter().map(|id| AttendeeId::new(*id)).collect(),
            tally: tally.to_vec(),
        }
    }

    #[test]
    fn test_first_update_populates_and_enables_options() {
        // テスト項目: 初回の更新で質問と選択肢が設定され、全てのボタンが有効になる
        // given (前提条件):
        let mut panel = PollPanel::new(false);

        // when (操作):
        panel.reconcile(&poll(&["A", "B", "C"], &[0, 0, 0], &[]), 4);

        // then (期待する結果):
        let view = panel.view();
        assert!(view.visible);
        assert_eq!(view.question, "Where to eat?");
        assert_eq!(view.options.len(), 3);
        assert!(view.options.iter().all(|o| o.enabled));
        assert_eq!(view.caption, "0 of 4 votes cast");
        assert_eq!(view.controls, None);
    }

    #[test]
    fn test_unused_slots_are_hidden() {
        // テスト項目: 使われない選択肢スロットは表示されない
        // given (前提条件):
        let mut panel = PollPanel::new(false);
        panel.reconcile(&poll(&["A", "B", "C", "D", "E"], &[0; 5], &[]), 2);
        panel.hide();

        // when (操作):
        panel.reconcile(&poll(&["Yes", "No"], &[0, 0], &[]), 2);

        // then (期待する結果):
        let labels: Vec<String> = panel.view().options.into_iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["Yes", "No"]);
    }

    #[test]
    fn test_meter_counts_total_on_every_update() {
        // テスト項目: 更新のたびに集計の合計がメーターに反映される
        // given (前提条件):
        let mut panel = PollPanel::new(false);
        panel.reconcile(&poll(&["A", "B"], &[0, 0], &[]), 3);

        // when (操作):
        panel.reconcile(&poll(&["A", "B"], &[1, 1], &[1, 2]), 5);

        // then (期待する結果):
        assert_eq!(panel.meter_caption(), "2 of 3 votes cast");
    }

    #[test]
    fn test_new_poll_after_close_resets_meter() {
        // テスト項目: 投票終了後の新しい投票ではメーターが 0 / 現在の参加者数にリセットされる
        // given (前提条件):
        let mut panel = PollPanel::new(false);
        panel.reconcile(&poll(&["A", "B"], &[0, 0], &[]), 3);
        panel.reconcile(&poll(&["A", "B"], &[2, 1], &[1, 2, 3]), 3);
        panel.hide();

        // when (操作):
        panel.reconcile(&poll(&["C", "D"], &[0, 0], &[]), 6);

        // then (期待する結果):
        assert_eq!(panel.meter_caption(), "0 of 6 votes cast");
        assert_eq!(panel.selected(), None);
    }

    #[test]
    fn test_changed_poll_is_populated_without_hiding() {
        // テスト項目: 表示中に質問や選択肢が替わった投票は初回と同じく設定し直される
        // given (前提条件):
        let mut panel = PollPanel::new(false);
        panel.reconcile(&poll(&["A", "B"], &[1, 0], &[]), 3);
        panel.cast_vote(0).unwrap();

        // when (操作):
        let replacement = Poll {
            question: "Dessert?".to_string(),
            ..poll(&["Cake", "Fruit", "None"], &[0, 0, 0], &[])
        };
        panel.reconcile(&replacement, 4);

        // then (期待する結果):
        let view = panel.view();
        assert_eq!(view.question, "Dessert?");
        assert_eq!(view.options.len(), 3);
        assert!(view.options.iter().all(|o| o.enabled && !o.selected));
        assert_eq!(view.caption, "0 of 4 votes cast");
        assert_eq!(panel.cast_vote(2), Ok("Dessert?".to_string()));
    }

    #[test]
    fn test_cast_vote_locks_all_buttons() {
        // テスト項目: 投票すると次の更新まで全てのボタンがロックされる
        // given (前提条件):
        let mut panel = PollPanel::new(false);
        panel.reconcile(&poll(&["A", "B"], &[0, 0], &[]), 2);

        // when (操作):
        let question = panel.cast_vote(1).unwrap();

        // then (期待する結果):
        assert_eq!(question, "Where to eat?");
        assert!(panel.view().options.iter().all(|o| !o.enabled));
        assert_eq!(panel.cast_vote(0), Err(CommandError::VoteLocked(0)));
    }

    #[test]
    fn test_update_after_vote_reenables_all_but_selection() {
        // テスト項目: 投票後の更新で、選択した選択肢以外のボタンが再び有効になる
        // given (前提条件):
        let mut panel = PollPanel::new(false);
        panel.reconcile(&poll(&["A", "B", "C"], &[0, 0, 0], &[]), 2);
        panel.cast_vote(1).unwrap();

        // when (操作):
        panel.reconcile(&poll(&["A", "B", "C"], &[0, 1, 0], &[1]), 2);

        // then (期待する結果):
        let enabled: Vec<bool> = panel.view().options.iter().map(|o| o.enabled).collect();
        assert_eq!(enabled, vec![true, false, true]);
        assert!(panel.view().options[1].selected);
    }

    #[test]
    fn test_vote_can_be_changed_after_update() {
        // テスト項目: 更新後は別の選択肢に投票し直せる
        // given (前提条件):
        let mut panel = PollPanel::new(false);
        panel.reconcile(&poll(&["A", "B"], &[0, 0], &[]), 2);
        panel.cast_vote(0).unwrap();
        panel.reconcile(&poll(&["A", "B"], &[1, 0], &[1]), 2);

        // when (操作):
        let result = panel.cast_vote(1);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(panel.selected(), Some(1));
    }

    #[test]
    fn test_cast_vote_rejects_hidden_or_missing_options() {
        // テスト項目: 投票がない場合や存在しない選択肢への投票は拒否される
        // given (前提条件):
        let mut panel = PollPanel::new(false);

        // when (操作):
        let without_poll = panel.cast_vote(0);
        panel.reconcile(&poll(&["A", "B"], &[0, 0], &[]), 2);
        let missing = panel.cast_vote(3);

        // then (期待する結果):
        assert_eq!(without_poll, Err(CommandError::NoActivePoll));
        assert_eq!(missing, Err(CommandError::InvalidOption(3)));
    }

    #[test]
    fn test_admin_sees_voters_and_poll_controls() {
        // テスト項目: 管理者には投票済みの参加者と投票の操作ボタンが表示される
        // given (前提条件):
        let mut panel = PollPanel::new(true);
        assert_eq!(
            panel.view().controls,
            Some(PollControlsView {
                new_poll_visible: true,
                abort_visible: false
            })
        );

        // when (操作):
        panel.reconcile(&poll(&["A", "B"], &[1, 0], &[7]), 2);

        // then (期待する結果):
        assert!(panel.voted().contains(&AttendeeId::new(7)));
        assert_eq!(
            panel.view().controls,
            Some(PollControlsView {
                new_poll_visible: false,
                abort_visible: true
            })
        );
    }

    #[test]
    fn test_hide_clears_voter_marks() {
        // テスト項目: 投票を閉じると投票済みマークが消える
        // given (前提条件):
        let mut panel = PollPanel::new(true);
        panel.reconcile(&poll(&["A", "B"], &[1, 0], &[7]), 2);

        // when (操作):
        panel.hide();

        // then (期待する結果):
        assert!(!panel.is_visible());
        assert!(panel.voted().is_empty());
    }
}
