use interview_types::EndedReason;

/// Per-question lifecycle inside the interview room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPhase {
    Idle,
    Answering,
    Recording,
    Submitted,
}

/// What the room must do after a countdown expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryFollowUp {
    NextQuestion(usize),
    FinishInterview(EndedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpiry {
    /// A recording was active and has been stopped.
    pub stopped_recording: bool,
    /// The currently typed answer must be submitted (false when the
    /// question was already submitted before the countdown ran out).
    pub submit_answer: bool,
    pub follow_up: ExpiryFollowUp,
}

/// Drives the interview room: one countdown per question, auto-submit on
/// expiry, auto-advance, timeout finish on the last question, abandonment
/// on teardown. Ticks are supplied by the host once per second; the machine
/// itself holds no clocks, so transitions are deterministic.
#[derive(Debug)]
pub struct RoomTimer {
    per_question_seconds: u32,
    total_questions: usize,
    current_question: usize,
    remaining_seconds: u32,
    phase: QuestionPhase,
    // Suppresses a second expiry while the next question's timer initializes.
    expiry_guard: bool,
    completed: bool,
}

impl RoomTimer {
    pub fn new(per_question_seconds: i32, total_questions: usize) -> Self {
        Self {
            per_question_seconds: per_question_seconds.max(0) as u32,
            total_questions,
            current_question: 0,
            remaining_seconds: 0,
            phase: QuestionPhase::Idle,
            expiry_guard: false,
            completed: false,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.per_question_seconds > 0
    }

    pub fn current_question(&self) -> usize {
        self.current_question
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn phase(&self) -> QuestionPhase {
        self.phase
    }

    /// Enter a question: restart the countdown and drop the expiry guard.
    pub fn begin_question(&mut self, index: usize) {
        self.current_question = index;
        self.remaining_seconds = self.per_question_seconds;
        self.phase = QuestionPhase::Answering;
        self.expiry_guard = false;
    }

    pub fn start_recording(&mut self) {
        if self.phase == QuestionPhase::Answering {
            self.phase = QuestionPhase::Recording;
        }
    }

    pub fn stop_recording(&mut self) {
        if self.phase == QuestionPhase::Recording {
            self.phase = QuestionPhase::Answering;
        }
    }

    /// The user submitted this question themselves.
    pub fn mark_submitted(&mut self) {
        self.phase = QuestionPhase::Submitted;
    }

    /// The user finished the whole interview themselves.
    pub fn finish(&mut self) {
        self.completed = true;
    }

    /// One second elapsed. Returns the required actions when the countdown
    /// ran out on this tick; `None` for untimed sessions, mid-countdown
    /// ticks, and ticks arriving while the guard is up.
    pub fn tick(&mut self) -> Option<TimerExpiry> {
        if !self.is_timed() || self.completed || self.phase == QuestionPhase::Idle {
            return None;
        }

        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        if self.remaining_seconds > 0 {
            return None;
        }
        if self.expiry_guard {
            return None;
        }
        self.expiry_guard = true;

        let stopped_recording = self.phase == QuestionPhase::Recording;
        let submit_answer = self.phase != QuestionPhase::Submitted;
        self.phase = QuestionPhase::Submitted;

        let follow_up = if self.current_question + 1 < self.total_questions {
            ExpiryFollowUp::NextQuestion(self.current_question + 1)
        } else {
            self.completed = true;
            ExpiryFollowUp::FinishInterview(EndedReason::Timeout)
        };

        Some(TimerExpiry {
            stopped_recording,
            submit_answer,
            follow_up,
        })
    }

    /// Page unload or component teardown. Best-effort only: the caller fires
    /// a keepalive finish request and must not wait for it; the server-side
    /// sweep remains the authoritative backstop.
    pub fn teardown(&self) -> Option<EndedReason> {
        if self.completed {
            None
        } else {
            Some(EndedReason::Abandoned)
        }
    }
}

/// Transcribed speech extends whatever was already typed, it never replaces it.
pub fn append_transcription(existing: &str, transcript: &str) -> String {
    if existing.trim().is_empty() {
        transcript.to_string()
    } else {
        format!("{existing} {transcript}")
    }
}
