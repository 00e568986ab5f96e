//! Reply parsing and grading.
//!
//! A reply is the rendered test with answers written into the slots. Parsing
//! is a single pass over its lines:
//!
//! - `AwaitingLanguageHeader` (initial): blank lines, the optional
//!   `Test ID: <n>` line, or a `<Source> → <Target>:` header.
//! - `AwaitingAnswerLine`: `  <prompt> = <answer>` lines or a new header. A
//!   blank line closes the section.
//!
//! Grading then matches every answer against the open questions of a test.
//! Neither step writes anything, so a reply is either applied as a whole via
//! [`apply_grades`] or not at all.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{MalformedReason, MemoError, ReplyError, StoreError};
use crate::gateway::Gateway;
use crate::model::{QuestionId, SheetEntry, TestId, Verdict};
use crate::render::{ARROW, TEST_ID_PREFIX};

/// A parsed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Test named by the `Test ID:` line, if present.
    pub test_id: Option<TestId>,
    pub sections: Vec<ReplySection>,
}

impl Reply {
    pub fn answer_count(&self) -> usize {
        self.sections.iter().map(|s| s.answers.len()).sum()
    }
}

/// Answers written under one language header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySection {
    pub source_language: String,
    pub target_language: String,
    /// 1-based line number of the header.
    pub line: usize,
    pub answers: Vec<AnswerLine>,
}

/// One `prompt = answer` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerLine {
    /// 1-based line number.
    pub line: usize,
    pub prompt: String,
    /// Trimmed answer; empty when the slot was left blank.
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingLanguageHeader,
    AwaitingAnswerLine,
}

enum Line<'a> {
    Blank,
    TestId(&'a str),
    Header(&'a str, &'a str),
    Answer(&'a str, &'a str),
}

fn malformed(line: usize, content: &str, reason: MalformedReason) -> ReplyError {
    ReplyError::Malformed {
        line,
        content: content.to_string(),
        reason,
    }
}

fn classify(line_no: usize, raw: &str) -> Result<Line<'_>, ReplyError> {
    let line = raw.trim_end();
    if line.is_empty() {
        return Ok(Line::Blank);
    }

    if line.starts_with(char::is_whitespace) {
        let (prompt, answer) = line
            .split_once('=')
            .ok_or_else(|| malformed(line_no, raw, MalformedReason::MissingEquals))?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(malformed(line_no, raw, MalformedReason::EmptyPrompt));
        }
        return Ok(Line::Answer(prompt, answer.trim()));
    }

    if let Some(rest) = line.strip_prefix(TEST_ID_PREFIX) {
        return Ok(Line::TestId(rest.trim()));
    }

    if let Some(body) = line.strip_suffix(':') {
        let (source, target) = body
            .split_once(ARROW)
            .ok_or_else(|| malformed(line_no, raw, MalformedReason::InvalidHeader))?;
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() || target.contains(ARROW) {
            return Err(malformed(line_no, raw, MalformedReason::InvalidHeader));
        }
        return Ok(Line::Header(source, target));
    }

    Err(malformed(line_no, raw, MalformedReason::UnrecognizedLine))
}

/// Parse a reply into sections of answers.
pub fn parse_reply(text: &str) -> Result<Reply, ReplyError> {
    let mut reply = Reply::default();
    let mut state = State::AwaitingLanguageHeader;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        state = match (state, classify(line_no, raw)?) {
            (_, Line::Blank) => State::AwaitingLanguageHeader,
            (State::AwaitingLanguageHeader, Line::TestId(value)) => {
                if reply.test_id.is_some() || !reply.sections.is_empty() {
                    return Err(malformed(line_no, raw, MalformedReason::InvalidTestId));
                }
                let id = value
                    .parse::<TestId>()
                    .map_err(|_| malformed(line_no, raw, MalformedReason::InvalidTestId))?;
                reply.test_id = Some(id);
                State::AwaitingLanguageHeader
            }
            (State::AwaitingAnswerLine, Line::TestId(_)) => {
                return Err(malformed(line_no, raw, MalformedReason::InvalidTestId));
            }
            (_, Line::Header(source, target)) => {
                reply.sections.push(ReplySection {
                    source_language: source.to_string(),
                    target_language: target.to_string(),
                    line: line_no,
                    answers: Vec::new(),
                });
                State::AwaitingAnswerLine
            }
            (State::AwaitingLanguageHeader, Line::Answer(..)) => {
                return Err(malformed(line_no, raw, MalformedReason::AnswerOutsideSection));
            }
            (State::AwaitingAnswerLine, Line::Answer(prompt, answer)) => {
                if let Some(section) = reply.sections.last_mut() {
                    section.answers.push(AnswerLine {
                        line: line_no,
                        prompt: prompt.to_string(),
                        answer: answer.to_string(),
                    });
                }
                State::AwaitingAnswerLine
            }
        };
    }

    tracing::debug!(
        sections = reply.sections.len(),
        answers = reply.answer_count(),
        "parsed reply"
    );
    Ok(reply)
}

/// How submitted answers are compared with expected phrases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeOptions {
    /// Compare with Unicode lowercase on both sides.
    pub ignore_case: bool,
}

impl GradeOptions {
    fn matches(self, submitted: &str, expected: &str) -> bool {
        if submitted.is_empty() {
            return false;
        }
        if self.ignore_case {
            submitted.to_lowercase() == expected.trim().to_lowercase()
        } else {
            submitted == expected.trim()
        }
    }
}

/// The outcome of one answer line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub question: QuestionId,
    pub line: usize,
    pub prompt: String,
    pub expected: String,
    pub submitted: String,
    pub verdict: Verdict,
}

/// Match every answer of `reply` with an open question in `sheet`.
///
/// The question must show the same prompt in the direction named by the
/// section header. Nothing is written.
pub fn grade_reply(
    reply: &Reply,
    sheet: &[SheetEntry],
    options: GradeOptions,
) -> Result<Vec<Grade>, ReplyError> {
    let mut answered: HashSet<QuestionId> = HashSet::new();
    let mut grades = Vec::with_capacity(reply.answer_count());

    for section in &reply.sections {
        for answer in &section.answers {
            let candidates = sheet.iter().filter(|e| {
                e.is_open()
                    && e.prompt == answer.prompt
                    && e.source_language.name == section.source_language
                    && e.target_language.name == section.target_language
            });

            // Several open questions may show the same prompt (homonyms).
            // Prefer the one this answer is right for.
            let mut seen_answered = false;
            let mut first_open = None;
            let mut matching = None;
            for entry in candidates {
                if answered.contains(&entry.question) {
                    seen_answered = true;
                    continue;
                }
                if options.matches(&answer.answer, &entry.expected) {
                    matching = Some(entry);
                    break;
                }
                first_open.get_or_insert(entry);
            }
            let found = matching.or(first_open);

            let entry = match found {
                Some(entry) => entry,
                None if seen_answered => {
                    return Err(ReplyError::Malformed {
                        line: answer.line,
                        content: format!("{} = {}", answer.prompt, answer.answer),
                        reason: MalformedReason::DuplicateAnswer,
                    });
                }
                None => {
                    return Err(ReplyError::UnknownQuestion {
                        line: answer.line,
                        prompt: answer.prompt.clone(),
                        source_language: section.source_language.clone(),
                        target_language: section.target_language.clone(),
                    });
                }
            };

            answered.insert(entry.question);
            grades.push(Grade {
                question: entry.question,
                line: answer.line,
                prompt: entry.prompt.clone(),
                expected: entry.expected.clone(),
                submitted: answer.answer.clone(),
                verdict: Verdict::from_correct(options.matches(&answer.answer, &entry.expected)),
            });
        }
    }

    Ok(grades)
}

/// Stage every grade through the gateway. Does not commit.
pub fn apply_grades<G: Gateway + ?Sized>(gateway: &mut G, grades: &[Grade]) -> Result<(), StoreError> {
    for grade in grades {
        gateway.record_result(grade.question, grade.verdict)?;
    }
    Ok(())
}

/// Parse, grade and stage a reply to `test`, then commit.
///
/// On any error the gateway is rolled back, so no question of the reply keeps
/// a result.
pub fn receive_reply<G: Gateway + ?Sized>(
    gateway: &mut G,
    test: TestId,
    text: &str,
    options: GradeOptions,
) -> Result<Vec<Grade>, MemoError> {
    let result = stage_reply(gateway, test, text, options).and_then(|grades| {
        gateway.commit()?;
        Ok(grades)
    });

    if let Err(e) = &result {
        tracing::warn!(test = %test, error = %e, "rejected reply");
        gateway.rollback()?;
    }
    result
}

fn stage_reply<G: Gateway + ?Sized>(
    gateway: &mut G,
    test: TestId,
    text: &str,
    options: GradeOptions,
) -> Result<Vec<Grade>, MemoError> {
    let reply = parse_reply(text)?;
    if let Some(found) = reply.test_id {
        if found != test {
            return Err(MemoError::TestMismatch {
                expected: test.0,
                found: found.0,
            });
        }
    }
    let sheet = gateway.test_sheet(test)?;
    let grades = grade_reply(&reply, &sheet, options)?;
    apply_grades(gateway, &grades)?;
    tracing::info!(test = %test, graded = grades.len(), "graded reply");
    Ok(grades)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::assembler::prepare_test;
    use crate::memory::MemoryGateway;
    use crate::model::{Direction, Language, LanguageId, PairId};
    use crate::render::{render_test, render_with};
    use crate::vocabulary::add_pair;

    fn polski() -> Language {
        Language {
            id: LanguageId(1),
            name: "polski".into(),
        }
    }

    fn espanol() -> Language {
        Language {
            id: LanguageId(2),
            name: "español".into(),
        }
    }

    fn entry(id: i64, direction: Direction, prompt: &str, expected: &str) -> SheetEntry {
        let (source_language, target_language) = match direction {
            Direction::Normal => (polski(), espanol()),
            Direction::Inverted => (espanol(), polski()),
        };
        SheetEntry {
            question: QuestionId(id),
            pair: PairId(id),
            direction,
            prompt: prompt.into(),
            expected: expected.into(),
            source_language,
            target_language,
            result: None,
        }
    }

    fn small_sheet() -> Vec<SheetEntry> {
        vec![
            entry(1, Direction::Normal, "wąż", "serpiente"),
            entry(2, Direction::Normal, "cebula", "cebolla"),
            entry(3, Direction::Inverted, "serpiente", "wąż"),
            entry(4, Direction::Inverted, "cebolla", "cebula"),
        ]
    }

    fn reason(err: ReplyError) -> MalformedReason {
        match err {
            ReplyError::Malformed { reason, .. } => reason,
            other => panic!("expected malformed line, got {other:?}"),
        }
    }

    #[test]
    fn parse_tiny_reply() {
        let reply = parse_reply("polski → español:\n  wąż = serpiente\n").unwrap();
        assert_eq!(reply.test_id, None);
        assert_eq!(reply.sections.len(), 1);
        assert_eq!(reply.sections[0].source_language, "polski");
        assert_eq!(reply.sections[0].target_language, "español");
        assert_eq!(
            reply.sections[0].answers,
            vec![AnswerLine {
                line: 2,
                prompt: "wąż".into(),
                answer: "serpiente".into(),
            }]
        );
    }

    #[test]
    fn parse_test_id_and_sections() {
        let text = "Test ID: 2\n\
                    \n\
                    polski → español:\n  cebula = cebolla\n  wąż = serpent\n\
                    \n\
                    español → polski:\n  cebolla = cebulka\n  serpiente = wąż\n";
        let reply = parse_reply(text).unwrap();
        assert_eq!(reply.test_id, Some(TestId(2)));
        assert_eq!(reply.sections.len(), 2);
        assert_eq!(reply.answer_count(), 4);
        assert_eq!(reply.sections[1].answers[1].line, 9);
    }

    #[test]
    fn parse_handles_crlf_and_blank_answers() {
        let reply = parse_reply("polski → español:\r\n  wąż = \r\n").unwrap();
        assert_eq!(reply.sections[0].answers[0].answer, "");
    }

    #[test]
    fn answer_before_header_is_malformed() {
        let err = parse_reply("  wąż = serpiente\n").unwrap_err();
        assert_eq!(err.line(), 1);
        assert_eq!(reason(err), MalformedReason::AnswerOutsideSection);
    }

    #[test]
    fn answer_after_blank_line_needs_new_header() {
        let err = parse_reply("polski → español:\n  wąż = serpiente\n\n  cebula = cebolla\n")
            .unwrap_err();
        assert_eq!(err.line(), 4);
        assert_eq!(reason(err), MalformedReason::AnswerOutsideSection);
    }

    #[test]
    fn grammar_errors() {
        let cases = [
            ("polski → español:\n  wąż serpiente\n", MalformedReason::MissingEquals),
            ("polski → español:\n   = serpiente\n", MalformedReason::EmptyPrompt),
            ("polski español:\n", MalformedReason::InvalidHeader),
            ("→ español:\n", MalformedReason::InvalidHeader),
            ("polski → español → english:\n", MalformedReason::InvalidHeader),
            ("hello there\n", MalformedReason::UnrecognizedLine),
            ("Test ID: two\n", MalformedReason::InvalidTestId),
            ("Test ID: 1\nTest ID: 1\n", MalformedReason::InvalidTestId),
            (
                "polski → español:\n  wąż = serpiente\nTest ID: 1\n",
                MalformedReason::InvalidTestId,
            ),
        ];
        for (text, expected) in cases {
            let err = parse_reply(text).unwrap_err();
            assert!(err.is_malformed());
            assert_eq!(reason(err), expected, "input: {text:?}");
        }
    }

    #[test]
    fn grade_marks_right_and_wrong() {
        let text = "polski → español:\n  cebula = cebolla\n  wąż = serpent\n\
                    \n\
                    español → polski:\n  cebolla = cebulka\n  serpiente = wąż\n";
        let reply = parse_reply(text).unwrap();
        let grades = grade_reply(&reply, &small_sheet(), GradeOptions::default()).unwrap();
        let verdicts: Vec<(i64, Verdict)> =
            grades.iter().map(|g| (g.question.0, g.verdict)).collect();
        assert_eq!(
            verdicts,
            vec![
                (2, Verdict::Correct),
                (1, Verdict::Incorrect),
                (4, Verdict::Incorrect),
                (3, Verdict::Correct),
            ]
        );
        assert_eq!(grades[1].expected, "serpiente");
        assert_eq!(grades[1].submitted, "serpent");
    }

    #[test]
    fn wrong_direction_is_unknown_question() {
        let reply = parse_reply("español → polski:\n  wąż = serpiente\n").unwrap();
        let err = grade_reply(&reply, &small_sheet(), GradeOptions::default()).unwrap_err();
        assert!(matches!(err, ReplyError::UnknownQuestion { line: 2, .. }));
        assert!(err.is_malformed());
    }

    #[test]
    fn graded_questions_are_not_open() {
        let mut sheet = small_sheet();
        sheet[0].result = Some(Verdict::Correct);
        let reply = parse_reply("polski → español:\n  wąż = serpiente\n").unwrap();
        let err = grade_reply(&reply, &sheet, GradeOptions::default()).unwrap_err();
        assert!(matches!(err, ReplyError::UnknownQuestion { .. }));
    }

    #[test]
    fn answering_twice_is_malformed() {
        let reply =
            parse_reply("polski → español:\n  wąż = serpiente\n  wąż = serpiente\n").unwrap();
        let err = grade_reply(&reply, &small_sheet(), GradeOptions::default()).unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(reason(err), MalformedReason::DuplicateAnswer);
    }

    #[test]
    fn blank_answer_is_incorrect() {
        let reply = parse_reply("polski → español:\n  wąż =\n").unwrap();
        let grades = grade_reply(&reply, &small_sheet(), GradeOptions::default()).unwrap();
        assert_eq!(grades[0].verdict, Verdict::Incorrect);
    }

    #[test]
    fn ignore_case_option() {
        let reply = parse_reply("polski → español:\n  wąż = Serpiente\n").unwrap();
        let strict = grade_reply(&reply, &small_sheet(), GradeOptions::default()).unwrap();
        assert_eq!(strict[0].verdict, Verdict::Incorrect);
        let relaxed =
            grade_reply(&reply, &small_sheet(), GradeOptions { ignore_case: true }).unwrap();
        assert_eq!(relaxed[0].verdict, Verdict::Correct);
    }

    #[test]
    fn shared_prompt_goes_to_the_question_it_answers() {
        let sheet = vec![
            entry(1, Direction::Normal, "zamek", "castillo"),
            entry(2, Direction::Normal, "zamek", "cerradura"),
        ];
        let reply =
            parse_reply("polski → español:\n  zamek = cerradura\n  zamek = castillo\n").unwrap();
        let grades = grade_reply(&reply, &sheet, GradeOptions::default()).unwrap();
        let verdicts: Vec<(i64, Verdict)> =
            grades.iter().map(|g| (g.question.0, g.verdict)).collect();
        assert_eq!(verdicts, vec![(2, Verdict::Correct), (1, Verdict::Correct)]);
    }

    #[test]
    fn shared_prompt_with_one_wrong_answer() {
        let sheet = vec![
            entry(1, Direction::Normal, "zamek", "castillo"),
            entry(2, Direction::Normal, "zamek", "cerradura"),
        ];
        let reply =
            parse_reply("polski → español:\n  zamek = puerta\n  zamek = castillo\n").unwrap();
        let grades = grade_reply(&reply, &sheet, GradeOptions::default()).unwrap();
        let verdicts: Vec<(i64, Verdict)> =
            grades.iter().map(|g| (g.question.0, g.verdict)).collect();
        assert_eq!(verdicts, vec![(1, Verdict::Incorrect), (2, Verdict::Correct)]);
        assert_eq!(grades[0].expected, "castillo");
        assert_eq!(grades[1].expected, "cerradura");
    }

    fn gateway_with_test(words: &[(&str, &str)]) -> (MemoryGateway, TestId) {
        let mut gateway = MemoryGateway::new();
        for &(pl, es) in words {
            add_pair(&mut gateway, ("polski", pl), ("español", es)).unwrap();
        }
        let test = prepare_test(&mut gateway, 20, Utc::now()).unwrap().test.id;
        gateway.commit().unwrap();
        (gateway, test)
    }

    #[test]
    fn rendered_test_filled_with_answers_is_all_correct() {
        let (mut gateway, test) = gateway_with_test(&[
            ("wąż", "serpiente"),
            ("komputer", "ordenador"),
            ("cebula", "cebolla"),
            ("iść", "ir"),
        ]);
        let sheet = gateway.test_sheet(test).unwrap();
        let text = render_with(test, &sheet, |e| e.expected.as_str());

        let grades = receive_reply(&mut gateway, test, &text, GradeOptions::default()).unwrap();
        assert_eq!(grades.len(), 8);

        let sheet = gateway.test_sheet(test).unwrap();
        assert!(sheet.iter().all(|e| e.result == Some(Verdict::Correct)));
    }

    #[test]
    fn homonyms_answered_in_any_order_are_correct() {
        let (mut gateway, test) =
            gateway_with_test(&[("zamek", "castillo"), ("zamek", "cerradura")]);
        let text = format!(
            "Test ID: {test}\n\n\
             polski → español:\n  zamek = cerradura\n  zamek = castillo\n\n\
             español → polski:\n  cerradura = zamek\n  castillo = zamek\n"
        );

        let grades = receive_reply(&mut gateway, test, &text, GradeOptions::default()).unwrap();
        assert_eq!(grades.len(), 4);
        assert!(grades.iter().all(|g| g.verdict == Verdict::Correct));
        let sheet = gateway.test_sheet(test).unwrap();
        assert!(sheet.iter().all(|e| e.result == Some(Verdict::Correct)));
    }

    #[test]
    fn padded_phrases_survive_the_round_trip() {
        let (mut gateway, test) = gateway_with_test(&[(" wąż ", "serpiente  "), ("kot", "\tgato")]);
        let sheet = gateway.test_sheet(test).unwrap();
        assert!(sheet.iter().all(|e| e.prompt == e.prompt.trim()));
        let text = render_with(test, &sheet, |e| e.expected.as_str());

        let grades = receive_reply(&mut gateway, test, &text, GradeOptions::default()).unwrap();
        assert_eq!(grades.len(), 4);
        assert!(grades.iter().all(|g| g.verdict == Verdict::Correct));
    }

    #[test]
    fn unknown_prompt_leaves_every_result_unset() {
        let (mut gateway, test) = gateway_with_test(&[("wąż", "serpiente"), ("cebula", "cebolla")]);
        let text = format!(
            "Test ID: {test}\n\npolski → español:\n  wąż = serpiente\n  kot = gato\n"
        );

        let err = receive_reply(&mut gateway, test, &text, GradeOptions::default()).unwrap_err();
        assert!(matches!(err, MemoError::Reply(ref e) if e.is_malformed()));

        let sheet = gateway.test_sheet(test).unwrap();
        assert!(sheet.iter().all(|e| e.result.is_none()));
    }

    #[test]
    fn tiny_reply_marks_single_question_correct() {
        let mut gateway = MemoryGateway::new();
        let pair = add_pair(&mut gateway, ("polski", "wąż"), ("español", "serpiente")).unwrap();
        let test = gateway.save_test(Utc::now()).unwrap();
        gateway
            .save_question(crate::model::NewQuestion {
                pair,
                test,
                direction: Direction::Normal,
            })
            .unwrap();
        gateway.commit().unwrap();

        let grades = receive_reply(
            &mut gateway,
            test,
            "polski → español:\n  wąż = serpiente\n",
            GradeOptions::default(),
        )
        .unwrap();
        assert_eq!(grades.len(), 1);
        assert_eq!(
            gateway.test_sheet(test).unwrap()[0].result,
            Some(Verdict::Correct)
        );
    }

    #[test]
    fn reply_for_another_test_is_rejected() {
        let (mut gateway, test) = gateway_with_test(&[("wąż", "serpiente")]);
        let err = receive_reply(
            &mut gateway,
            test,
            "Test ID: 99\n\npolski → español:\n  wąż = serpiente\n",
            GradeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MemoError::TestMismatch { found: 99, .. }));
    }

    #[test]
    fn rendered_blank_test_parses() {
        let (gateway, test) = gateway_with_test(&[("wąż", "serpiente")]);
        let sheet = gateway.test_sheet(test).unwrap();
        let reply = parse_reply(&render_test(test, &sheet)).unwrap();
        assert_eq!(reply.test_id, Some(test));
        assert_eq!(reply.answer_count(), 2);
        assert!(reply
            .sections
            .iter()
            .flat_map(|s| &s.answers)
            .all(|a| a.answer.is_empty()));
    }
}
