use promptsync::snapshot::{Prompt, Snapshot};
use promptsync::tree::{ComponentType, Node, Tree};
use promptsync::types::NodeId;

/// Deterministic id source yielding `g1`, `g2`, ...
pub fn sequential_ids() -> impl FnMut() -> NodeId + Send + 'static {
    let mut next = 0;
    move || {
        next += 1;
        format!("g{}", next)
    }
}

pub fn library() -> Snapshot {
    Snapshot::new(
        Tree::new(vec![
            Node::folder(
                "f-writing",
                "Writing",
                vec![
                    Node::component("c-tone", "Tone", ComponentType::Style, "Warm and direct."),
                    Node::component("c-brief", "Brevity", ComponentType::Instruction, "Keep it short."),
                ],
            ),
            Node::component("c-role", "Editor", ComponentType::Role, "You are a careful editor."),
        ]),
        vec![Prompt {
            id: "p-email".to_string(),
            name: "Email".to_string(),
            component_ids: vec!["c-role".to_string(), "c-tone".to_string()],
        }],
    )
}
