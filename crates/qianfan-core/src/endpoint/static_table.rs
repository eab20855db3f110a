//! Compiled-in model endpoints
//!
//! Used when the service catalog is unavailable or knows nothing about a
//! model. Names are matched case-insensitively.

use super::capability::Capability;

const CHAT: &[(&str, &str)] = &[
    ("ERNIE-4.0-8K", "/chat/completions_pro"),
    ("ERNIE-4.0-Turbo-8K", "/chat/ernie-4.0-turbo-8k"),
    ("ERNIE-3.5-8K", "/chat/completions"),
    ("ERNIE-3.5-128K", "/chat/ernie-3.5-128k"),
    ("ERNIE-Speed-8K", "/chat/ernie_speed"),
    ("ERNIE-Speed-128K", "/chat/ernie-speed-128k"),
    ("ERNIE-Lite-8K", "/chat/ernie-lite-8k"),
    ("ERNIE-Tiny-8K", "/chat/ernie-tiny-8k"),
    ("ERNIE-Character-8K", "/chat/ernie-char-8k"),
    ("ERNIE-Functions-8K", "/chat/ernie-func-8k"),
    ("ERNIE-Bot-4", "/chat/completions_pro"),
    ("ERNIE-Bot", "/chat/completions"),
    ("ERNIE-Bot-turbo", "/chat/eb-instant"),
    ("Llama-2-7b-chat", "/chat/llama_2_7b"),
    ("Llama-2-13b-chat", "/chat/llama_2_13b"),
    ("Llama-2-70b-chat", "/chat/llama_2_70b"),
    ("Meta-Llama-3-8B", "/chat/llama_3_8b"),
    ("Meta-Llama-3-70B", "/chat/llama_3_70b"),
    ("Qianfan-Chinese-Llama-2-7B", "/chat/qianfan_chinese_llama_2_7b"),
    ("ChatGLM2-6B-32K", "/chat/chatglm2_6b_32k"),
    ("BLOOMZ-7B", "/chat/bloomz_7b1"),
    ("Mixtral-8x7B-Instruct", "/chat/mixtral_8x7b_instruct"),
    ("Yi-34B-Chat", "/chat/yi_34b_chat"),
];

const COMPLETIONS: &[(&str, &str)] = &[
    ("SQLCoder-7B", "/completions/sqlcoder_7b"),
    ("CodeLlama-7b-Instruct", "/completions/codellama_7b_instruct"),
];

const EMBEDDINGS: &[(&str, &str)] = &[
    ("Embedding-V1", "/embeddings/embedding-v1"),
    ("bge-large-zh", "/embeddings/bge_large_zh"),
    ("bge-large-en", "/embeddings/bge_large_en"),
    ("tao-8k", "/embeddings/tao_8k"),
];

const RERANKER: &[(&str, &str)] = &[("bce-reranker-base_v1", "/reranker/bce_reranker_base")];

const TEXT2IMAGE: &[(&str, &str)] = &[("Stable-Diffusion-XL", "/text2image/sd_xl")];

const IMAGE2TEXT: &[(&str, &str)] = &[("Fuyu-8B", "/image2text/fuyu_8b")];

const PLUGIN: &[(&str, &str)] = &[("EBPluginV2", "/erniebot/plugin")];

/// Entries for one capability
pub fn entries(capability: Capability) -> &'static [(&'static str, &'static str)] {
    match capability {
        Capability::Chat => CHAT,
        Capability::Completions => COMPLETIONS,
        Capability::Embeddings => EMBEDDINGS,
        Capability::Reranker => RERANKER,
        Capability::Text2Image => TEXT2IMAGE,
        Capability::Image2Text => IMAGE2TEXT,
        Capability::Plugin => PLUGIN,
        Capability::Console => &[],
    }
}

/// Endpoint suffix of a model, any letter case
pub fn lookup(capability: Capability, model: &str) -> Option<&'static str> {
    entries(capability)
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(model))
        .map(|(_, suffix)| *suffix)
}

/// Model used when a request names none
pub fn default_model(capability: Capability) -> Option<&'static str> {
    match capability {
        Capability::Chat => Some("ERNIE-Lite-8K"),
        Capability::Completions => Some("SQLCoder-7B"),
        Capability::Embeddings => Some("Embedding-V1"),
        Capability::Reranker => Some("bce-reranker-base_v1"),
        Capability::Text2Image => Some("Stable-Diffusion-XL"),
        Capability::Image2Text => None,
        Capability::Plugin => Some("EBPluginV2"),
        Capability::Console => None,
    }
}
