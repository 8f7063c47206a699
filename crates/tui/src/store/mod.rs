//! Data fetched from the API, and the requests to fetch it.
//!
//! Every request is tagged with the store's current generation. Moving to a new screen or
//! re-requesting a page bumps the generation, which cancels any quiz sweep in progress and
//! makes the store drop responses that arrive late.
use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::Sender,
    Arc,
};

use lms_client::{
    course::{Course, CoursePage, CourseUpdate},
    modules::Module,
    quiz::{quiz_targets, QuizKey, QuizMap, QuizTarget, VideoQuiz},
    Client, Error as ClientError, Role, Tenant,
};
use log::{debug, error, warn};

mod worker;
use worker::Worker;

use crate::{event::EventBus, main_screen::Action};

pub type Generation = u64;

/// Something we've asked for
#[derive(Debug, Default)]
pub enum Loadable<T> {
    #[default]
    NotRequested,
    Loading,
    Loaded(T),
    /// The message to show the user
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_not_requested(&self) -> bool {
        matches!(self, Loadable::NotRequested)
    }
}

/// Which piece of state a request fills in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    CoursePage,
    Course,
    Modules,
    Quizzes,
    Update,
}

/// Requests sent to the worker thread
#[derive(Debug)]
pub enum Request {
    CoursePage {
        generation: Generation,
        page: u32,
        limit: u32,
    },
    Course {
        generation: Generation,
        course_id: String,
    },
    Modules {
        generation: Generation,
        course_id: String,
    },
    ProbeQuizzes {
        generation: Generation,
        course_name: String,
        targets: Vec<QuizTarget>,
    },
    UpdateCourse {
        generation: Generation,
        course_id: String,
        update: CourseUpdate,
    },
}

impl Request {
    fn generation(&self) -> Generation {
        match self {
            Request::CoursePage { generation, .. }
            | Request::Course { generation, .. }
            | Request::Modules { generation, .. }
            | Request::ProbeQuizzes { generation, .. }
            | Request::UpdateCourse { generation, .. } => *generation,
        }
    }

    fn slot(&self) -> Slot {
        match self {
            Request::CoursePage { .. } => Slot::CoursePage,
            Request::Course { .. } => Slot::Course,
            Request::Modules { .. } => Slot::Modules,
            Request::ProbeQuizzes { .. } => Slot::Quizzes,
            Request::UpdateCourse { .. } => Slot::Update,
        }
    }
}

/// Messages received by the app from the worker thread
#[derive(Debug)]
pub enum Event {
    Error {
        generation: Generation,
        slot: Slot,
        error: ClientError,
    },
    CoursePage {
        generation: Generation,
        page: CoursePage,
    },
    Course {
        generation: Generation,
        course: Course,
    },
    Modules {
        generation: Generation,
        modules: Vec<Module>,
    },
    Quizzes {
        generation: Generation,
        quizzes: QuizMap,
    },
    CourseUpdated {
        generation: Generation,
        course_id: String,
    },
}

impl Event {
    fn generation(&self) -> Generation {
        match self {
            Event::Error { generation, .. }
            | Event::CoursePage { generation, .. }
            | Event::Course { generation, .. }
            | Event::Modules { generation, .. }
            | Event::Quizzes { generation, .. }
            | Event::CourseUpdated { generation, .. } => *generation,
        }
    }
}

/// Global data store
pub struct Store {
    tenant: Tenant,
    role: Role,

    course_page: Loadable<CoursePage>,
    course: Loadable<Course>,
    modules: Loadable<Vec<Module>>,
    quizzes: Loadable<QuizMap>,
    update: Loadable<()>,

    generation: Arc<AtomicU64>,
    worker_channel: Sender<Request>,
}

impl Store {
    pub fn new(bus: &EventBus, client: Client) -> Self {
        let session = client.session();
        let generation = Arc::new(AtomicU64::new(0));

        Self {
            tenant: Tenant::new(&session.tenant_id),
            role: session.role,
            worker_channel: Worker::spawn_on(bus, client, generation.clone()),
            generation,
            course_page: Default::default(),
            course: Default::default(),
            modules: Default::default(),
            quizzes: Default::default(),
            update: Default::default(),
        }
    }

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn current_generation(&self) -> Generation {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether nothing has been reset or re-requested since `generation`
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current_generation() == generation
    }

    /// Start a new generation, invalidating anything in flight
    fn next_generation(&self) -> Generation {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn send(&self, req: Request) {
        debug!("requesting {:?}", req);
        if let Err(e) = self.worker_channel.send(req) {
            error!("store worker has gone away: {}", e);
        }
    }

    /// Throw away everything about the current course, cancelling in-flight requests.
    pub fn reset_course(&mut self) {
        self.next_generation();
        self.course = Loadable::NotRequested;
        self.modules = Loadable::NotRequested;
        self.quizzes = Loadable::NotRequested;
        self.update = Loadable::NotRequested;
    }

    pub fn course_page(&self) -> &Loadable<CoursePage> {
        &self.course_page
    }

    /// Request a page of the course list. Any previous page request is superseded.
    pub fn request_course_page(&mut self, page: u32, limit: u32) {
        let generation = self.next_generation();
        self.course_page = Loadable::Loading;
        self.send(Request::CoursePage {
            generation,
            page,
            limit,
        });
    }

    pub fn course(&self) -> &Loadable<Course> {
        &self.course
    }

    pub fn modules(&self) -> &Loadable<Vec<Module>> {
        &self.modules
    }

    /// Load a course and its module tree. Quiz probing starts once both have arrived.
    pub fn open_course(&mut self, course_id: &str) {
        self.reset_course();
        let generation = self.current_generation();

        self.course = Loadable::Loading;
        self.modules = Loadable::Loading;
        self.send(Request::Course {
            generation,
            course_id: course_id.to_string(),
        });
        self.send(Request::Modules {
            generation,
            course_id: course_id.to_string(),
        });
    }

    /// Load just the course, for editing
    pub fn open_course_for_edit(&mut self, course_id: &str) {
        self.reset_course();
        self.course = Loadable::Loading;
        self.send(Request::Course {
            generation: self.current_generation(),
            course_id: course_id.to_string(),
        });
    }

    pub fn quizzes_loaded(&self) -> bool {
        self.quizzes.loaded().is_some()
    }

    pub fn quiz(&self, key: &QuizKey) -> Option<&VideoQuiz> {
        self.quizzes.loaded().and_then(|q| q.get(key))
    }

    pub fn update_state(&self) -> &Loadable<()> {
        &self.update
    }

    pub fn submit_update(&mut self, course_id: &str, update: CourseUpdate) {
        self.update = Loadable::Loading;
        self.send(Request::UpdateCourse {
            generation: self.current_generation(),
            course_id: course_id.to_string(),
            update,
        });
    }

    /// Kick off the quiz sweep if we have everything it needs and haven't started it yet.
    fn maybe_probe_quizzes(&mut self) {
        let (Some(course), Some(modules)) = (self.course.loaded(), self.modules.loaded()) else {
            return;
        };
        if !self.quizzes.is_not_requested() {
            return;
        }

        let req = Request::ProbeQuizzes {
            generation: self.current_generation(),
            course_name: course.name.clone(),
            targets: quiz_targets(modules),
        };
        self.quizzes = Loadable::Loading;
        self.send(req);
    }

    pub fn event(&mut self, e: Event) -> Action {
        if e.generation() != self.current_generation() {
            debug!("dropping stale event from generation {}", e.generation());
            return Action::None;
        }

        match e {
            Event::Error {
                error: ClientError::Unauthorized,
                ..
            } => return Action::Reauthenticate,
            Event::Error { slot, error, .. } => {
                warn!("{:?} request failed: {}", slot, error);
                let msg = error.user_message().to_string();
                match slot {
                    Slot::CoursePage => self.course_page = Loadable::Failed(msg),
                    Slot::Course => self.course = Loadable::Failed(msg),
                    Slot::Modules => self.modules = Loadable::Failed(msg),
                    // probing already absorbs per-quiz failures, so this is unexpected
                    Slot::Quizzes => self.quizzes = Loadable::Loaded(QuizMap::new()),
                    Slot::Update => self.update = Loadable::Failed(msg),
                }
            }
            Event::CoursePage { page, .. } => self.course_page = Loadable::Loaded(page),
            Event::Course { course, .. } => {
                self.course = Loadable::Loaded(course);
                self.maybe_probe_quizzes();
            }
            Event::Modules { modules, .. } => {
                self.modules = Loadable::Loaded(modules);
                self.maybe_probe_quizzes();
            }
            Event::Quizzes { quizzes, .. } => self.quizzes = Loadable::Loaded(quizzes),
            Event::CourseUpdated { course_id, .. } => {
                debug!("course {course_id} saved");
                self.update = Loadable::Loaded(());
                return Action::CourseSaved;
            }
        };

        Action::None
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lms_client::Session;

    use super::*;

    fn store(bus: &EventBus) -> Store {
        let client =
            Client::new("http://127.0.0.1:9", Duration::from_millis(50), Session::default())
                .unwrap();
        Store::new(bus, client)
    }

    #[test]
    fn reopening_the_editor_outdates_earlier_saves() {
        let bus = EventBus::new();
        let mut store = store(&bus);

        store.open_course_for_edit("c1");
        let saved_at = store.current_generation();
        assert!(store.is_current(saved_at));

        store.reset_course();
        store.open_course_for_edit("c2");
        assert!(!store.is_current(saved_at));
    }

    #[test]
    fn stale_responses_are_dropped() {
        let bus = EventBus::new();
        let mut store = store(&bus);
        store.open_course_for_edit("c1");
        let old = store.current_generation();
        store.open_course_for_edit("c2");

        store.event(Event::CourseUpdated {
            generation: old,
            course_id: "c1".to_string(),
        });
        assert!(matches!(store.update_state(), Loadable::NotRequested));
    }
}
