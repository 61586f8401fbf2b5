//! Agent scripts and tree extraction/merge prompts.

use crate::tree::{DecisionTree, FrontierPath};

/// Script for the first call when no seed tree is available.
pub const INITIAL_AGENT_SCRIPT: &str = "\
You are a customer calling a company's customer service line. Your goal is to:
- Respond to the agent's questions and guidance.

Be polite and provide essential information as requested by the agent. You may express \
frustration if appropriate, but remain respectful.";

/// System message for tree extraction.
pub const EXTRACT_SYSTEM: &str =
    "You are a helpful assistant that creates decision trees from conversations.";

/// System message for tree merging.
pub const MERGE_SYSTEM: &str = "You are a helpful assistant that merges decision trees.";

/// Build the extraction prompt for one call transcript.
pub fn extract_tree_prompt(transcript: &str) -> String {
    format!(
        "\
Given the following transcribed conversation, create a decision tree representation.
Each node should represent a decision point, question, or significant part of the conversation.
If a node is a question, split the tree based on all possible answers (e.g., Yes/No). Do not use \"Other\".
If any option is not explicitly covered in the conversation, fill it with \"Unknown\" as a placeholder.

Ensure that for every question:
- Both \"Yes\" and \"No\" branches (or other relevant alternatives) are explicitly included.
- Avoid adding a third option if the question is binary (e.g., Yes/No).
- The response branches should be filled with appropriate actions or placeholders (\"Unknown\") if the outcome is unclear or not specified.
- Limit the number of branches. If the question asked is open-ended, we likely don't need a branch. Focus on decision points.
- Unknown cannot be a key in the dictionary.
- Check for redundancy and ensure logical consistency.
- Do not make catch-all nodes like \"Other\".

Format the tree as a JSON object where:
- Each key is a decision, question, or statement.
- The value is either another JSON object (for further decisions) or \"Unknown\" (for undecided or unknown outcomes).

Transcribed conversation:
{transcript}

Provide the decision tree as a valid JSON object. ONLY output the JSON object."
    )
}

/// Build the prompt that merges a new fragment into the cumulative tree.
pub fn merge_trees_prompt(existing: &DecisionTree, fragment: &DecisionTree) -> String {
    format!(
        "\
You are given two decision trees represented as JSON objects.
These are AI voice agent call trees.
Do not add information that is not present in the trees.
Your task is to merge them into a single decision tree.
The merged tree should contain all unique paths from both trees.
If a path exists in both trees, ensure that the merged tree reflects the most comprehensive version.
Ensure we do not go backwards in information: never turn a resolved outcome back into \"Unknown\".
Unknown cannot be a key in the tree, only a value.
Check that our tree is split correctly. If there is a yes or no, there should not be a third node.
We can remove or merge nodes only if they are redundant and it is logical to do so.
If a value is Unknown, do not guess what the value should be.
Merge similar keys to avoid duplication. For example, combine \"Air conditioning\" and \"Air conditioning issue\" into a single key.

Existing Tree:
{existing}

New Tree:
{fragment}

Provide the merged decision tree as a valid JSON object. ONLY output the JSON object.",
        existing = existing.to_pretty_json(),
        fragment = fragment.to_pretty_json(),
    )
}

/// Script for the next call, aimed at the branches still marked unknown.
///
/// The whole cumulative tree is embedded so the caller does not re-ask
/// resolved questions; the frontier paths are listed as explicit targets.
pub fn synthesize_next_script(tree: &DecisionTree, frontier: &[FrontierPath]) -> String {
    let targets = if frontier.is_empty() {
        "- (none listed; look for any value marked \"Unknown\")".to_string()
    } else {
        frontier
            .iter()
            .map(|path| format!("- {path}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "\
You are calling a customer service line. Your goal is to:
- fill in the unknown parts of this decision tree
- Make sure to not ask redundant questions or provide responses we already have information on.

Decision Tree:
{tree}

Branches still unknown (steer the conversation down these paths):
{targets}

Be polite and provide essential information as requested by the agent. You may express \
frustration if appropriate, but remain respectful.",
        tree = tree.to_pretty_json(),
    )
}
