use lms_client::modules::{locate_first_video, resolve_first_video, Module, Subtopic, Topic, VideoItem};
use pretty_assertions::assert_eq;

fn video(id: &str) -> VideoItem {
    VideoItem {
        id: id.to_string(),
        url: format!("https://videos.example/{id}.mp4"),
        title: Some(format!("Video {id}")),
    }
}

fn module(json: &str) -> Module {
    serde_json::from_str(json).unwrap()
}

#[test]
fn direct_module_video_wins() {
    let m = module(
        r#"{"_id": "m1", "title": "Fractions", "videoUrl": "https://videos.example/intro.mp4",
            "videos": [{"_id": "v1", "url": "https://videos.example/v1.mp4"}]}"#,
    );

    let v = resolve_first_video(&m).unwrap();
    assert_eq!(v.id, "m1");
    assert_eq!(v.url, "https://videos.example/intro.mp4");
}

#[test]
fn module_video_list_used_without_topics_or_direct_video() {
    let m = module(
        r#"{"_id": "m1", "title": "Fractions", "videoUrl": "",
            "videos": [{"_id": "v1", "url": "https://videos.example/v1.mp4"},
                       {"_id": "v2", "url": "https://videos.example/v2.mp4"}]}"#,
    );

    assert_eq!(resolve_first_video(&m).map(|v| v.id), Some("v1".to_string()));
}

#[test]
fn topic_prefers_first_subtopic_over_own_videos() {
    let topic = Topic {
        id: "t1".into(),
        name: "Adding".into(),
        subtopics: vec![Subtopic {
            id: "s1".into(),
            name: "Like denominators".into(),
            videos: vec![video("s1v1")],
        }],
        videos: vec![video("t1v1")],
    };

    assert_eq!(resolve_first_video(&topic), Some(video("s1v1")));
}

#[test]
fn only_the_first_subtopic_is_consulted() {
    let topic = Topic {
        id: "t1".into(),
        name: "Adding".into(),
        subtopics: vec![
            Subtopic {
                id: "s1".into(),
                name: "Empty".into(),
                videos: vec![],
            },
            Subtopic {
                id: "s2".into(),
                name: "Full".into(),
                videos: vec![video("s2v1")],
            },
        ],
        videos: vec![video("t1v1")],
    };

    assert_eq!(resolve_first_video(&topic), Some(video("t1v1")));
}

#[test]
fn searches_topics_depth_first() {
    let mut m = module(r#"{"_id": "m1", "title": "Fractions"}"#);
    m.topics = vec![
        Topic {
            id: "t1".into(),
            name: "Empty".into(),
            subtopics: vec![],
            videos: vec![],
        },
        Topic {
            id: "t2".into(),
            name: "Second".into(),
            subtopics: vec![Subtopic {
                id: "s1".into(),
                name: "Deep".into(),
                videos: vec![video("deep")],
            }],
            videos: vec![video("t2v1")],
        },
    ];

    assert_eq!(resolve_first_video(&m), Some(video("deep")));

    let found = locate_first_video(&m).unwrap();
    assert_eq!((found.topic, found.subtopic), (Some(1), Some(0)));
}

#[test]
fn module_level_video_is_located_on_the_module() {
    let mut m = module(
        r#"{"_id": "m1", "title": "Fractions",
            "videos": [{"_id": "mv1", "url": "https://videos.example/mv1.mp4"}]}"#,
    );
    m.topics = vec![Topic {
        id: "t1".into(),
        name: "Adding".into(),
        subtopics: vec![Subtopic {
            id: "s1".into(),
            name: "Like denominators".into(),
            videos: vec![video("s1v1")],
        }],
        videos: vec![],
    }];

    let found = locate_first_video(&m).unwrap();
    assert_eq!(found.video.id, "mv1");
    assert_eq!((found.topic, found.subtopic), (None, None));
}

#[test]
fn nothing_found_in_empty_subtree() {
    let m = module(r#"{"_id": "m1", "title": "Fractions", "topics": [{"_id": "t1", "name": "Empty"}]}"#);
    assert_eq!(resolve_first_video(&m), None);

    let s = Subtopic {
        id: "s1".into(),
        name: "Empty".into(),
        videos: vec![],
    };
    assert_eq!(resolve_first_video(&s), None);
}

#[test]
fn resolution_is_idempotent() {
    let m = module(
        r#"{"_id": "m1", "title": "Fractions",
            "topics": [{"_id": "t1", "name": "A", "videos": [{"_id": "v9", "url": "u"}]}]}"#,
    );

    let first = resolve_first_video(&m);
    assert_eq!(first, resolve_first_video(&m));
    assert_eq!(first.map(|v| v.id), Some("v9".to_string()));
}
