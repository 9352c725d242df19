//! Meeting open/finished status and the control affordances it implies.

use super::view::ControlsView;

/// Which set of administrative controls is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlsMode {
    /// Meeting not open yet (or re-opened after being finished)
    Closed,
    /// Meeting open and running
    InProgress,
    /// Meeting marked finished
    Finished,
}

/// Status flags as last reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeetingStatus {
    pub is_open: bool,
    pub is_finished: bool,
}

impl MeetingStatus {
    pub fn controls_mode(&self) -> ControlsMode {
        match (self.is_open, self.is_finished) {
            (false, _) => ControlsMode::Closed,
            (true, false) => ControlsMode::InProgress,
            (true, true) => ControlsMode::Finished,
        }
    }

    /// A finished meeting can only be opened again by an explicit re-open.
    pub fn open_button_label(&self) -> &'static str {
        if self.is_finished {
            "Re-open meeting"
        } else {
            "Open meeting"
        }
    }

    pub fn controls_view(&self) -> ControlsView {
        ControlsView {
            mode: self.controls_mode(),
            open_button_label: self.open_button_label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_mode_for_each_status() {
        // テスト項目: 状態フラグの組み合わせごとに表示する操作が決まる
        // given (前提条件):
        let cases = [
            (false, false, ControlsMode::Closed),
            (true, false, ControlsMode::InProgress),
            (true, true, ControlsMode::Finished),
            (false, true, ControlsMode::Closed),
        ];

        for (is_open, is_finished, expected) in cases {
            // when (操作):
            let status = MeetingStatus {
                is_open,
                is_finished,
            };

            // then (期待する結果):
            assert_eq!(status.controls_mode(), expected);
        }
    }

    #[test]
    fn test_open_button_reads_reopen_once_finished() {
        // テスト項目: 終了済みの会議では開始ボタンが「Re-open meeting」になる
        // given (前提条件):
        let finished = MeetingStatus {
            is_open: false,
            is_finished: true,
        };

        // when (操作):
        let view = finished.controls_view();

        // then (期待する結果):
        assert_eq!(view.open_button_label, "Re-open meeting");
        assert_eq!(MeetingStatus::default().open_button_label(), "Open meeting");
    }
}
