//! Video quizzes, and probing which parts of a course have one
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{modules::Module, Client, Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(alias = "questionText")]
    pub question: String,
    /// Option text, by option key (`"A"`, `"B"`, ...)
    #[serde(deserialize_with = "keyed_options")]
    pub options: BTreeMap<String, String>,
    #[serde(alias = "correctAnswer", alias = "answer")]
    pub correct_option: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VideoQuiz {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

impl VideoQuiz {
    /// Number of questions answered correctly. `answers` is indexed like `questions`.
    pub fn score(&self, answers: &[Option<String>]) -> usize {
        self.questions
            .iter()
            .zip(answers)
            .filter(|(q, a)| a.as_deref() == Some(q.correct_option.as_str()))
            .count()
    }
}

/// Options come either keyed already, or as a list we key alphabetically.
fn keyed_options<'de, D>(d: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Object(m) => m
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
        Value::Array(vs) => ('A'..='Z')
            .zip(vs)
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k.to_string(), s)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuizPayload {
    One(VideoQuiz),
    Many(Vec<VideoQuiz>),
}

impl QuizPayload {
    /// The first quiz that actually has questions
    fn into_quiz(self) -> Option<VideoQuiz> {
        match self {
            QuizPayload::One(q) => Some(q),
            QuizPayload::Many(qs) => qs.into_iter().find(|q| !q.questions.is_empty()),
        }
        .filter(|q| !q.questions.is_empty())
    }
}

/// Identifies what a quiz belongs to. Displays as `video-<id>` / `module-<id>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QuizKey {
    Module(String),
    Video(String),
}

impl fmt::Display for QuizKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizKey::Module(id) => write!(f, "module-{id}"),
            QuizKey::Video(id) => write!(f, "video-{id}"),
        }
    }
}

/// The quizzes that exist for a course. A missing key means "no quiz".
pub type QuizMap = HashMap<QuizKey, VideoQuiz>;

/// Something to probe for a quiz
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizTarget {
    pub key: QuizKey,
    pub lookup: QuizLookup,
}

/// How a quiz is looked up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizLookup {
    ModuleName(String),
    VideoTitle(String),
}

/// Everything in the tree worth probing: each module, then each titled video. Duplicate videos
/// are only probed once.
pub fn quiz_targets(modules: &[Module]) -> Vec<QuizTarget> {
    let mut targets = vec![];
    for m in modules {
        targets.push(QuizTarget {
            key: QuizKey::Module(m.id.clone()),
            lookup: QuizLookup::ModuleName(m.name.clone()),
        });
    }

    for v in modules.iter().flat_map(Module::all_videos) {
        let Some(title) = v.title.as_ref().filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        let key = QuizKey::Video(v.id.clone());
        if targets.iter().any(|t| t.key == key) {
            continue;
        }
        targets.push(QuizTarget {
            key,
            lookup: QuizLookup::VideoTitle(title.clone()),
        });
    }

    targets
}

impl Client {
    /// Look up the quiz for a module, trying the nested route before the query-string one.
    pub fn module_quiz(&self, module_name: &str, course_name: &str) -> Result<Option<VideoQuiz>> {
        let nested = self.get_optional::<QuizPayload>(
            &["vq", "module", module_name, "course", course_name],
            &[],
        )?;
        let payload = match nested {
            Some(p) => Some(p),
            None => self.get_optional::<QuizPayload>(
                &["vq", "module", module_name],
                &[("courseName", course_name)],
            )?,
        };

        Ok(payload.and_then(QuizPayload::into_quiz))
    }

    pub fn video_quiz(&self, title: &str, course_name: &str) -> Result<Option<VideoQuiz>> {
        Ok(self
            .get_optional::<QuizPayload>(&["vq", "title", title], &[("courseName", course_name)])?
            .and_then(QuizPayload::into_quiz))
    }

    /// Probe every target in turn, collecting the quizzes that exist.
    ///
    /// A failed probe counts as "no quiz" and doesn't stop the sweep, except for `Unauthorized`
    /// which is returned immediately. Returns `Ok(None)` if `cancelled` reports true between probes.
    pub fn probe_quizzes(
        &self,
        course_name: &str,
        targets: &[QuizTarget],
        cancelled: impl Fn() -> bool,
    ) -> Result<Option<QuizMap>> {
        let mut found = QuizMap::new();
        for target in targets {
            if cancelled() {
                debug!("quiz sweep for {course_name} cancelled");
                return Ok(None);
            }

            let res = match &target.lookup {
                QuizLookup::ModuleName(name) => self.module_quiz(name, course_name),
                QuizLookup::VideoTitle(title) => self.video_quiz(title, course_name),
            };
            match res {
                Ok(Some(quiz)) => {
                    found.insert(target.key.clone(), quiz);
                }
                Ok(None) => (),
                Err(Error::Unauthorized) => return Err(Error::Unauthorized),
                Err(e) => warn!("quiz probe for {} failed: {}", target.key, e),
            }
        }

        debug!(
            "{} of {} quiz probes found a quiz",
            found.len(),
            targets.len()
        );
        Ok(Some(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_display_with_prefix() {
        assert_eq!(QuizKey::Video("42".into()).to_string(), "video-42");
        assert_eq!(QuizKey::Module("m1".into()).to_string(), "module-m1");
    }

    #[test]
    fn list_options_are_keyed_alphabetically() {
        let q: QuizQuestion = serde_json::from_str(
            r#"{"question": "2+2?", "options": ["3", "4"], "correctAnswer": "B", "explanation": "sums"}"#,
        )
        .unwrap();

        assert_eq!(q.options.get("A").map(String::as_str), Some("3"));
        assert_eq!(q.options.get("B").map(String::as_str), Some("4"));
        assert_eq!(q.correct_option, "B");
    }

    #[test]
    fn empty_quizzes_count_as_missing() {
        let empty = VideoQuiz {
            id: "q".into(),
            title: None,
            questions: vec![],
        };
        assert_eq!(QuizPayload::One(empty.clone()).into_quiz(), None);
        assert_eq!(QuizPayload::Many(vec![empty]).into_quiz(), None);
        assert_eq!(QuizPayload::Many(vec![]).into_quiz(), None);
    }

    #[test]
    fn scoring() {
        let q = |correct: &str| QuizQuestion {
            question: "?".into(),
            options: BTreeMap::new(),
            correct_option: correct.into(),
            explanation: String::new(),
        };
        let quiz = VideoQuiz {
            id: "q".into(),
            title: None,
            questions: vec![q("A"), q("B"), q("C")],
        };

        assert_eq!(
            quiz.score(&[Some("A".into()), Some("C".into()), None]),
            1
        );
        assert_eq!(quiz.score(&[]), 0);
    }
}
