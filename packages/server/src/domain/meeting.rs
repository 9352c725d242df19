//! Meeting aggregate: transcript, presence, status and the running poll.
//!
//! All rules live here as plain synchronous methods. Each accepted command
//! returns the [`Effect`]s the caller has to carry out (deliveries, closes,
//! timers); nothing in here touches a socket.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    time::Duration,
};

use agora_shared::{
    protocol::{
        AttendeeDto, AttendeeRef, EntryDto, InboundEvent, MAX_POLL_ANSWERS, MIN_POLL_ANSWERS,
        OutboundCommand, PollDto, StatusDto, close_code,
    },
    time::entry_stamp,
};

use super::error::MeetingError;

/// Number of distinct attendee colors
pub const ATTENDEE_COLORS: u32 = 8;

/// Someone allowed into the meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub id: i64,
    pub name: String,
    pub color: u32,
    pub admin: bool,
}

impl Attendee {
    pub fn new(id: i64, name: impl Into<String>, admin: bool) -> Self {
        Self {
            id,
            name: name.into(),
            color: id.rem_euclid(i64::from(ATTENDEE_COLORS)) as u32,
            admin,
        }
    }

    pub fn dto(&self) -> AttendeeDto {
        AttendeeDto {
            id: self.id,
            name: self.name.clone(),
            color: Some(self.color),
        }
    }
}

/// Who receives an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    EveryoneExcept(i64),
    Only(i64),
}

/// Something the caller must do after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Deliver {
        audience: Audience,
        event: InboundEvent,
    },
    /// Close the attendee's connection
    Close { attendee: i64, code: u16 },
    /// Call [`Meeting::close_poll`] with `generation` after `delay`
    ClosePollAfter { generation: u64, delay: Duration },
}

impl Effect {
    fn everyone(event: InboundEvent) -> Self {
        Effect::Deliver {
            audience: Audience::Everyone,
            event,
        }
    }
}

#[derive(Debug, Clone)]
struct RunningPoll {
    generation: u64,
    question: String,
    answers: Vec<String>,
    /// Attendee id -> chosen answer index
    votes: BTreeMap<i64, usize>,
}

impl RunningPoll {
    fn tally(&self) -> Vec<u32> {
        let mut tally = vec![0; self.answers.len()];
        for &vote in self.votes.values() {
            tally[vote] += 1;
        }
        tally
    }

    fn dto(&self) -> PollDto {
        PollDto {
            question: self.question.clone(),
            answers: self.answers.clone(),
            voted: self.votes.keys().copied().collect(),
            tally: self.tally(),
        }
    }

    fn summary(&self) -> String {
        let results: Vec<String> = self
            .answers
            .iter()
            .zip(self.tally())
            .map(|(answer, count)| format!("{}: {}", answer, count))
            .collect();
        format!("Poll closed: {} ({})", self.question, results.join(", "))
    }
}

/// One meeting and everything that happens in it.
#[derive(Debug)]
pub struct Meeting {
    id: String,
    keys: HashMap<String, i64>,
    attendees: BTreeMap<i64, Attendee>,
    banned: HashSet<String>,
    present: BTreeSet<i64>,
    entries: Vec<EntryDto>,
    status: StatusDto,
    poll: Option<RunningPoll>,
    poll_generation: u64,
    utc_offset_hours: i32,
}

impl Meeting {
    /// Create a meeting.
    ///
    /// # Arguments
    ///
    /// * `id` - Meeting id used in connection paths
    /// * `access` - Access key and attendee pairs
    /// * `utc_offset_hours` - Offset used for entry timestamps
    pub fn new(
        id: impl Into<String>,
        access: impl IntoIterator<Item = (String, Attendee)>,
        utc_offset_hours: i32,
    ) -> Self {
        let mut keys = HashMap::new();
        let mut attendees = BTreeMap::new();
        for (key, attendee) in access {
            keys.insert(key, attendee.id);
            attendees.insert(attendee.id, attendee);
        }
        Self {
            id: id.into(),
            keys,
            attendees,
            banned: HashSet::new(),
            present: BTreeSet::new(),
            entries: Vec::new(),
            status: StatusDto {
                isopen: false,
                isfinished: false,
            },
            poll: None,
            poll_generation: 0,
            utc_offset_hours,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> StatusDto {
        self.status
    }

    pub fn entries(&self) -> &[EntryDto] {
        &self.entries
    }

    pub fn poll(&self) -> Option<PollDto> {
        self.poll.as_ref().map(RunningPoll::dto)
    }

    pub fn is_present(&self, id: i64) -> bool {
        self.present.contains(&id)
    }

    /// Mark the meeting open without announcing it.
    pub fn set_open(&mut self, open: bool) {
        self.status.isopen = open;
    }

    /// Look up who a key belongs to.
    pub fn authorize(&self, meeting_id: &str, key: &str) -> Result<Attendee, MeetingError> {
        if meeting_id != self.id {
            return Err(MeetingError::UnknownMeeting(meeting_id.to_string()));
        }
        if self.banned.contains(key) {
            return Err(MeetingError::Banned);
        }
        self.keys
            .get(key)
            .and_then(|id| self.attendees.get(id))
            .cloned()
            .ok_or(MeetingError::InvalidKey)
    }

    /// Mark an attendee present. Returns the effects of a first arrival.
    pub fn join(&mut self, attendee: &Attendee) -> Vec<Effect> {
        if !self.present.insert(attendee.id) {
            return Vec::new();
        }
        vec![Effect::Deliver {
            audience: Audience::EveryoneExcept(attendee.id),
            event: InboundEvent::AddUser(attendee.dto()),
        }]
    }

    pub fn leave(&mut self, id: i64) -> Vec<Effect> {
        if !self.present.remove(&id) {
            return Vec::new();
        }
        vec![Effect::Deliver {
            audience: Audience::EveryoneExcept(id),
            event: InboundEvent::RemoveUser(AttendeeRef { id }),
        }]
    }

    /// Events sent to a freshly connected attendee: status, entries after
    /// `since`, attendees and the poll.
    pub fn greeting(&self, since: i64) -> Vec<InboundEvent> {
        let replay = self
            .entries
            .iter()
            .filter(|entry| entry.id > since)
            .cloned()
            .collect();
        vec![
            InboundEvent::Status(self.status),
            InboundEvent::Messages(replay),
            InboundEvent::Users(self.users()),
            InboundEvent::Poll(self.poll()),
        ]
    }

    /// Present attendees sorted by name.
    pub fn users(&self) -> Vec<AttendeeDto> {
        let mut users: Vec<AttendeeDto> = self
            .present
            .iter()
            .filter_map(|id| self.attendees.get(id))
            .map(Attendee::dto)
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        users
    }

    fn append(&mut self, author: Option<&Attendee>, message: String, now_millis: i64) -> EntryDto {
        let stamp = entry_stamp(now_millis, self.utc_offset_hours);
        let id = self.entries.last().map_or(1, |last| last.id + 1);
        let entry = EntryDto {
            id,
            time: stamp.time,
            date: stamp.date,
            fromname: author.map(|a| a.name.clone()),
            color: author.map(|a| a.color),
            message,
        };
        self.entries.push(entry.clone());
        entry
    }

    fn system_entry(&mut self, message: impl Into<String>, now_millis: i64) -> Effect {
        let entry = self.append(None, message.into(), now_millis);
        Effect::everyone(InboundEvent::Message(entry))
    }

    /// Apply a command from `sender`.
    pub fn handle(
        &mut self,
        sender: &Attendee,
        command: OutboundCommand,
        now_millis: i64,
    ) -> Result<Vec<Effect>, MeetingError> {
        if !matches!(
            command,
            OutboundCommand::Message { .. } | OutboundCommand::Vote { .. }
        ) && !sender.admin
        {
            return Err(MeetingError::NotAdministrator);
        }

        match command {
            OutboundCommand::Message { message } => {
                if !self.status.isopen && !sender.admin {
                    return Err(MeetingError::MeetingClosed);
                }
                let message = message.trim();
                if message.is_empty() {
                    return Err(MeetingError::EmptyMessage);
                }
                let entry = self.append(Some(sender), message.to_string(), now_millis);
                Ok(vec![Effect::everyone(InboundEvent::Message(entry))])
            }
            OutboundCommand::Vote { question, vote } => {
                let poll = self.poll.as_mut().ok_or(MeetingError::NoPoll)?;
                if poll.question != question {
                    return Err(MeetingError::QuestionMismatch);
                }
                if vote >= poll.answers.len() {
                    return Err(MeetingError::InvalidOption(vote));
                }
                poll.votes.insert(sender.id, vote);
                Ok(vec![Effect::everyone(InboundEvent::Poll(Some(poll.dto())))])
            }
            OutboundCommand::NewPoll {
                question,
                answers,
                minutes,
            } => self.start_poll(question, answers, minutes, now_millis),
            OutboundCommand::AbortPoll => {
                if self.poll.take().is_none() {
                    return Err(MeetingError::NoPoll);
                }
                Ok(vec![
                    self.system_entry("Poll aborted", now_millis),
                    Effect::everyone(InboundEvent::Poll(None)),
                ])
            }
            OutboundCommand::Open => {
                if self.status.isopen {
                    return Err(MeetingError::AlreadyOpen);
                }
                let text = if self.status.isfinished {
                    "Meeting re-opened"
                } else {
                    "Meeting opened"
                };
                self.status = StatusDto {
                    isopen: true,
                    isfinished: false,
                };
                Ok(vec![
                    self.system_entry(text, now_millis),
                    Effect::everyone(InboundEvent::Status(self.status)),
                ])
            }
            OutboundCommand::Finish => {
                if !self.status.isopen {
                    return Err(MeetingError::MeetingClosed);
                }
                self.status = StatusDto {
                    isopen: false,
                    isfinished: true,
                };
                let mut effects = vec![self.system_entry("Meeting finished", now_millis)];
                if self.poll.take().is_some() {
                    effects.push(Effect::everyone(InboundEvent::Poll(None)));
                }
                effects.push(Effect::everyone(InboundEvent::Status(self.status)));
                Ok(effects)
            }
            OutboundCommand::Kick { user, canrejoin } => {
                self.kick(sender, user, canrejoin, now_millis)
            }
        }
    }

    fn start_poll(
        &mut self,
        question: String,
        answers: Vec<String>,
        minutes: u32,
        now_millis: i64,
    ) -> Result<Vec<Effect>, MeetingError> {
        if !self.status.isopen {
            return Err(MeetingError::MeetingClosed);
        }
        if self.poll.is_some() {
            return Err(MeetingError::PollRunning);
        }
        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(MeetingError::InvalidPoll("question is empty"));
        }
        let answers: Vec<String> = answers
            .iter()
            .map(|answer| answer.trim())
            .filter(|answer| !answer.is_empty())
            .map(str::to_string)
            .collect();
        if answers.len() < MIN_POLL_ANSWERS || answers.len() > MAX_POLL_ANSWERS {
            return Err(MeetingError::InvalidPoll("needs two to five answers"));
        }

        self.poll_generation += 1;
        let poll = RunningPoll {
            generation: self.poll_generation,
            question,
            answers,
            votes: BTreeMap::new(),
        };
        let started = format!("Poll started: {}", poll.question);
        let dto = poll.dto();
        self.poll = Some(poll);

        let mut effects = vec![
            self.system_entry(started, now_millis),
            Effect::everyone(InboundEvent::Poll(Some(dto))),
        ];
        // Zero minutes keeps the poll open until aborted
        if minutes > 0 {
            effects.push(Effect::ClosePollAfter {
                generation: self.poll_generation,
                delay: Duration::from_secs(u64::from(minutes) * 60),
            });
        }
        Ok(effects)
    }

    fn kick(
        &mut self,
        sender: &Attendee,
        user: i64,
        canrejoin: bool,
        now_millis: i64,
    ) -> Result<Vec<Effect>, MeetingError> {
        if user == sender.id {
            return Err(MeetingError::CannotKickSelf);
        }
        if !self.present.contains(&user) {
            return Err(MeetingError::UnknownAttendee(user));
        }
        let name = self
            .attendees
            .get(&user)
            .map(|a| a.name.clone())
            .ok_or(MeetingError::UnknownAttendee(user))?;

        if !canrejoin {
            for (key, _) in self.keys.iter().filter(|(_, id)| **id == user) {
                self.banned.insert(key.clone());
            }
        }

        let notice = self.append(
            None,
            format!("{} was disconnected by an administrator", name),
            now_millis,
        );
        Ok(vec![
            Effect::Deliver {
                audience: Audience::Only(user),
                event: InboundEvent::Disconnect(notice.clone()),
            },
            Effect::Deliver {
                audience: Audience::EveryoneExcept(user),
                event: InboundEvent::Message(notice),
            },
            Effect::Close {
                attendee: user,
                code: close_code::KICKED,
            },
        ])
    }

    /// Close the poll started as `generation`, posting its result.
    ///
    /// Does nothing if that poll already ended.
    pub fn close_poll(&mut self, generation: u64, now_millis: i64) -> Vec<Effect> {
        let Some(poll) = self.poll.take_if(|poll| poll.generation == generation) else {
            return Vec::new();
        };
        vec![
            self.system_entry(poll.summary(), now_millis),
            Effect::everyone(InboundEvent::Poll(None)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_717_230_000_000;

    fn admin() -> Attendee {
        Attendee::new(1, "Ada", true)
    }

    fn bob() -> Attendee {
        Attendee::new(2, "Bob", false)
    }

    fn meeting() -> Meeting {
        let mut meeting = Meeting::new(
            "10",
            vec![
                ("admin-key".to_string(), admin()),
                ("bob-key".to_string(), bob()),
            ],
            0,
        );
        meeting.join(&admin());
        meeting.join(&bob());
        meeting
    }

    fn open_meeting() -> Meeting {
        let mut meeting = meeting();
        meeting.set_open(true);
        meeting
    }

    fn new_poll(minutes: u32) -> OutboundCommand {
        OutboundCommand::NewPoll {
            question: "Lunch?".to_string(),
            answers: vec!["Pizza".to_string(), " ".to_string(), "Sushi".to_string()],
            minutes,
        }
    }

    fn events(effects: &[Effect]) -> Vec<&InboundEvent> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Deliver { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_authorize_known_key() {
        // テスト項目: 登録済みのキーで参加者が特定される
        // given (前提条件):
        let meeting = meeting();

        // when (操作):
        let result = meeting.authorize("10", "bob-key");

        // then (期待する結果):
        assert_eq!(result, Ok(bob()));
    }

    #[test]
    fn test_authorize_rejects_unknown_key_and_meeting() {
        // テスト項目: 未知のキーや会議は拒否される
        // given (前提条件):
        let meeting = meeting();

        // when (操作):
        let unknown_key = meeting.authorize("10", "nope");
        let unknown_meeting = meeting.authorize("11", "bob-key");

        // then (期待する結果):
        assert_eq!(unknown_key, Err(MeetingError::InvalidKey));
        assert_eq!(
            unknown_meeting,
            Err(MeetingError::UnknownMeeting("11".to_string()))
        );
        assert_eq!(MeetingError::InvalidKey.close_code(), close_code::INVALID_KEY);
    }

    #[test]
    fn test_join_twice_announces_once() {
        // テスト項目: 同じ参加者の二重参加は一度だけ通知される
        // given (前提条件):
        let mut meeting = Meeting::new("10", vec![("bob-key".to_string(), bob())], 0);

        // when (操作):
        let first = meeting.join(&bob());
        let second = meeting.join(&bob());

        // then (期待する結果):
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_greeting_replays_entries_after_since() {
        // テスト項目: 接続時の挨拶には since より後のエントリだけが含まれる
        // given (前提条件):
        let mut meeting = open_meeting();
        for text in ["one", "two", "three"] {
            meeting
                .handle(
                    &bob(),
                    OutboundCommand::Message {
                        message: text.to_string(),
                    },
                    NOW,
                )
                .unwrap();
        }

        // when (操作):
        let greeting = meeting.greeting(1);

        // then (期待する結果):
        assert!(matches!(greeting[0], InboundEvent::Status(status) if status.isopen));
        match &greeting[1] {
            InboundEvent::Messages(entries) => {
                let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
                assert_eq!(ids, vec![2, 3]);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(
            greeting[2],
            InboundEvent::Users(vec![admin().dto(), bob().dto()])
        );
        assert_eq!(greeting[3], InboundEvent::Poll(None));
    }

    #[test]
    fn test_message_rejected_while_closed_unless_admin() {
        // テスト項目: 会議が閉じている間は管理者以外の発言が拒否される
        // given (前提条件):
        let mut meeting = meeting();
        let message = || OutboundCommand::Message {
            message: "hi".to_string(),
        };

        // when (操作):
        let from_bob = meeting.handle(&bob(), message(), NOW);
        let from_admin = meeting.handle(&admin(), message(), NOW);

        // then (期待する結果):
        assert_eq!(from_bob, Err(MeetingError::MeetingClosed));
        assert!(from_admin.is_ok());
        assert_eq!(meeting.entries()[0].fromname.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_non_admin_cannot_open() {
        // テスト項目: 管理者以外は会議を開けない
        // given (前提条件):
        let mut meeting = meeting();

        // when (操作):
        let result = meeting.handle(&bob(), OutboundCommand::Open, NOW);

        // then (期待する結果):
        assert_eq!(result, Err(MeetingError::NotAdministrator));
    }

    #[test]
    fn test_finish_then_reopen() {
        // テスト項目: 終了した会議は再度開くことができ、状態が通知される
        // given (前提条件):
        let mut meeting = open_meeting();
        meeting.handle(&admin(), OutboundCommand::Finish, NOW).unwrap();

        // when (操作):
        let effects = meeting.handle(&admin(), OutboundCommand::Open, NOW).unwrap();

        // then (期待する結果):
        let events = events(&effects);
        assert!(matches!(events[0], InboundEvent::Message(entry) if entry.message == "Meeting re-opened"));
        assert_eq!(
            *events[1],
            InboundEvent::Status(StatusDto {
                isopen: true,
                isfinished: false
            })
        );
    }

    #[test]
    fn test_new_poll_skips_blank_answers_and_schedules_close() {
        // テスト項目: 新しい投票は空の選択肢を除き、自動終了が予定される
        // given (前提条件):
        let mut meeting = open_meeting();

        // when (操作):
        let effects = meeting.handle(&admin(), new_poll(5), NOW).unwrap();

        // then (期待する結果):
        assert_eq!(meeting.poll().unwrap().answers, vec!["Pizza", "Sushi"]);
        assert!(effects.contains(&Effect::ClosePollAfter {
            generation: 1,
            delay: Duration::from_secs(300)
        }));
    }

    #[test]
    fn test_zero_minute_poll_has_no_timer() {
        // テスト項目: 0 分の投票には自動終了が予定されない
        // given (前提条件):
        let mut meeting = open_meeting();

        // when (操作):
        let effects = meeting.handle(&admin(), new_poll(0), NOW).unwrap();

        // then (期待する結果):
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, Effect::ClosePollAfter { .. }))
        );
    }

    #[test]
    fn test_vote_can_be_changed() {
        // テスト項目: 投票は変更でき、集計は最後の投票だけを数える
        // given (前提条件):
        let mut meeting = open_meeting();
        meeting.handle(&admin(), new_poll(5), NOW).unwrap();
        let vote = |index| OutboundCommand::Vote {
            question: "Lunch?".to_string(),
            vote: index,
        };

        // when (操作):
        meeting.handle(&bob(), vote(0), NOW).unwrap();
        meeting.handle(&bob(), vote(1), NOW).unwrap();

        // then (期待する結果):
        let poll = meeting.poll().unwrap();
        assert_eq!(poll.tally, vec![0, 1]);
        assert_eq!(poll.voted, vec![2]);
    }

    #[test]
    fn test_vote_for_replaced_poll_is_rejected() {
        // テスト項目: 質問が一致しない投票は拒否される
        // given (前提条件):
        let mut meeting = open_meeting();
        meeting.handle(&admin(), new_poll(5), NOW).unwrap();

        // when (操作):
        let result = meeting.handle(
            &bob(),
            OutboundCommand::Vote {
                question: "Dinner?".to_string(),
                vote: 0,
            },
            NOW,
        );

        // then (期待する結果):
        assert_eq!(result, Err(MeetingError::QuestionMismatch));
    }

    #[test]
    fn test_close_poll_posts_summary_once() {
        // テスト項目: 投票の自動終了で結果が投稿され、古い世代の終了は無視される
        // given (前提条件):
        let mut meeting = open_meeting();
        meeting.handle(&admin(), new_poll(5), NOW).unwrap();
        meeting
            .handle(
                &bob(),
                OutboundCommand::Vote {
                    question: "Lunch?".to_string(),
                    vote: 1,
                },
                NOW,
            )
            .unwrap();

        // when (操作):
        let stale = meeting.close_poll(7, NOW);
        let effects = meeting.close_poll(1, NOW);
        let again = meeting.close_poll(1, NOW);

        // then (期待する結果):
        assert!(stale.is_empty());
        assert!(again.is_empty());
        let events = events(&effects);
        assert!(matches!(
            events[0],
            InboundEvent::Message(entry) if entry.message == "Poll closed: Lunch? (Pizza: 0, Sushi: 1)"
        ));
        assert_eq!(*events[1], InboundEvent::Poll(None));
        assert!(meeting.poll().is_none());
    }

    #[test]
    fn test_kick_without_rejoin_bans_key() {
        // テスト項目: 再参加不可で切断するとキーが禁止され、通知と切断が行われる
        // given (前提条件):
        let mut meeting = open_meeting();

        // when (操作):
        let effects = meeting
            .handle(
                &admin(),
                OutboundCommand::Kick {
                    user: 2,
                    canrejoin: false,
                },
                NOW,
            )
            .unwrap();

        // then (期待する結果):
        assert!(matches!(
            &effects[0],
            Effect::Deliver { audience: Audience::Only(2), event: InboundEvent::Disconnect(_) }
        ));
        assert_eq!(
            effects[2],
            Effect::Close {
                attendee: 2,
                code: close_code::KICKED
            }
        );
        assert_eq!(meeting.authorize("10", "bob-key"), Err(MeetingError::Banned));
    }

    #[test]
    fn test_admin_cannot_kick_self() {
        // テスト項目: 管理者は自分自身を切断できない
        // given (前提条件):
        let mut meeting = open_meeting();

        // when (操作):
        let result = meeting.handle(
            &admin(),
            OutboundCommand::Kick {
                user: 1,
                canrejoin: true,
            },
            NOW,
        );

        // then (期待する結果):
        assert_eq!(result, Err(MeetingError::CannotKickSelf));
    }

    #[test]
    fn test_leave_announces_removal() {
        // テスト項目: 退出すると他の参加者に通知される
        // given (前提条件):
        let mut meeting = meeting();

        // when (操作):
        let effects = meeting.leave(2);

        // then (期待する結果):
        assert_eq!(
            effects,
            vec![Effect::Deliver {
                audience: Audience::EveryoneExcept(2),
                event: InboundEvent::RemoveUser(AttendeeRef { id: 2 })
            }]
        );
        assert!(!meeting.is_present(2));
    }
}
