pub mod classifier;
pub mod extract;
pub mod llm;

pub use classifier::{CannedReply, MessageAnalysis, MessageClassifier, RuleBasedClassifier};
pub use extract::{
    ExtractedItem, FailoverExtractor, KeywordExtractor, LlmExtractor, ProductExtractor,
};
pub use llm::{HttpLlmClient, LlmClient, LlmError};
