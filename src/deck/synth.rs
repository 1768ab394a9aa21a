//! Stand-in content generator.
//!
//! Produces one content string per content slide from a topic. The output is
//! canned: a fixed set of Python facts when the topic mentions Python, a
//! generic overview line otherwise.

/// Topic used when the request provides none.
pub const DEFAULT_TOPIC: &str = "Introduction to Python basics.";

/// Content used for topics that mention Python, in slide order.
pub const PYTHON_POINTS: [&str; 5] = [
    "Python is a high-level, interpreted programming language known for its readability.",
    "Example: Print 'Hello, World!' using print('Hello, World!').",
    "Python supports multiple data types like lists, dictionaries, and tuples.",
    "Example: Create a list with my_list = [1, 2, 3] and append with my_list.append(4).",
    "Python's simplicity makes it ideal for beginners and professionals alike.",
];

/// Generate exactly `count` content strings for `topic`.
///
/// A blank topic is replaced by [`DEFAULT_TOPIC`]. Canned lists shorter than
/// `count` are repeated from the start.
pub fn synthesize(topic: &str, count: usize) -> Vec<String> {
    let topic = match topic.trim() {
        "" => DEFAULT_TOPIC,
        trimmed => trimmed,
    };

    if topic.to_lowercase().contains("python") {
        PYTHON_POINTS
            .iter()
            .cycle()
            .take(count)
            .map(|s| s.to_string())
            .collect()
    } else {
        vec![format!("Overview of {}.", topic); count]
    }
}
