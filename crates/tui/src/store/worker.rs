use lms_client::Client;
use log::debug;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::{channel, Receiver, Sender},
    Arc,
};

use super::{Event, Generation, Request};
use crate::event::{Event as CrateEvent, EventBus};

/// Performs requests it receives from the main thread, and sends the results back.
pub struct Worker {
    client: Client,
    generation: Arc<AtomicU64>,
    msg_recv: Receiver<Request>,
    event_send: Sender<CrateEvent>,
}

impl Worker {
    /// Spawn the store worker on the given event bus, returning a channel to send commands down.
    pub(crate) fn spawn_on(
        bus: &EventBus,
        client: Client,
        generation: Arc<AtomicU64>,
    ) -> Sender<Request> {
        let (cmd_send, cmd_recv) = channel();

        bus.spawn("store_worker", move |_, event_send| {
            // we don't need running because the receiver will raise an error and we'll exit
            Worker {
                client,
                generation,
                msg_recv: cmd_recv,
                event_send,
            }
            .main()
        });

        cmd_send
    }

    fn main(self) {
        while let Ok(msg) = self.msg_recv.recv() {
            debug!("received message: {:?}", msg);
            let (generation, slot) = (msg.generation(), msg.slot());
            if self.is_stale(generation) {
                debug!("skipping stale request");
                continue;
            }

            let res = match self.process_msg(msg) {
                Ok(Some(e)) => self.event_send.send(CrateEvent::Store(e)),
                Ok(None) => Ok(()),
                Err(error) => self.event_send.send(CrateEvent::Store(Event::Error {
                    generation,
                    slot,
                    error,
                })),
            };
            if let Err(e) = res {
                debug!("error sending event: {:?}", e);
                break;
            }
        }

        debug!("shutting down");
    }

    fn is_stale(&self, generation: Generation) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn process_msg(&self, msg: Request) -> Result<Option<Event>, lms_client::Error> {
        match msg {
            Request::CoursePage {
                generation,
                page,
                limit,
            } => {
                let page = self.client.courses(page, limit)?;
                Ok(Some(Event::CoursePage { generation, page }))
            }
            Request::Course {
                generation,
                course_id,
            } => {
                let course = self.client.course(&course_id)?;
                Ok(Some(Event::Course { generation, course }))
            }
            Request::Modules {
                generation,
                course_id,
            } => {
                let modules = self.client.course_modules(&course_id)?;
                Ok(Some(Event::Modules {
                    generation,
                    modules,
                }))
            }
            Request::ProbeQuizzes {
                generation,
                course_name,
                targets,
            } => Ok(self
                .client
                .probe_quizzes(&course_name, &targets, || self.is_stale(generation))?
                .map(|quizzes| Event::Quizzes {
                    generation,
                    quizzes,
                })),
            Request::UpdateCourse {
                generation,
                course_id,
                update,
            } => {
                self.client.update_course(&course_id, update)?;
                Ok(Some(Event::CourseUpdated {
                    generation,
                    course_id,
                }))
            }
        }
    }
}
