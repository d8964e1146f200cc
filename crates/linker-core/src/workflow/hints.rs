//! Node-type category hints and model-field heuristics.

use crate::config::is_model_extension;
use crate::matcher::split_extension;

/// Loader node types and the category their model input lives in.
pub const NODE_CATEGORY_HINTS: &[(&str, &str)] = &[
    ("CheckpointLoaderSimple", "checkpoints"),
    ("CheckpointLoader", "checkpoints"),
    ("unCLIPCheckpointLoader", "checkpoints"),
    ("VAELoader", "vae"),
    ("LoraLoader", "loras"),
    ("LoraLoaderModelOnly", "loras"),
    ("UNETLoader", "diffusion_models"),
    ("ControlNetLoader", "controlnet"),
    ("ControlNetLoaderAdvanced", "controlnet"),
    ("CLIPLoader", "text_encoders"),
    ("CLIPVisionLoader", "clip_vision"),
    ("UpscaleModelLoader", "upscale_models"),
    ("HypernetworkLoader", "hypernetworks"),
    ("EmbeddingLoader", "embeddings"),
];

/// Input names that hold model filenames in the execution format.
pub const MODEL_INPUT_FIELDS: &[&str] = &[
    "ckpt_name",
    "checkpoint_name",
    "model_name",
    "vae_name",
    "lora_name",
    "unet_name",
    "clip_name",
    "control_net_name",
    "controlnet_name",
    "upscale_model",
    "hypernetwork_name",
    "embedding_name",
];

/// Expected category for a node type, if it is a known loader.
pub fn category_hint(node_type: &str) -> Option<&'static str> {
    NODE_CATEGORY_HINTS
        .iter()
        .find(|(ty, _)| *ty == node_type)
        .map(|(_, category)| *category)
}

/// True when `value` ends in a known model extension (case-insensitive).
pub fn is_model_filename(value: &str) -> bool {
    let (_, ext) = split_extension(value);
    is_model_extension(ext)
}

/// True when an input name suggests a model reference.
pub fn is_model_field(field_name: &str) -> bool {
    let name = field_name.to_lowercase();
    MODEL_INPUT_FIELDS.contains(&name.as_str()) || name.ends_with("_name")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_hint() {
        assert_eq!(category_hint("CheckpointLoaderSimple"), Some("checkpoints"));
        assert_eq!(category_hint("LoraLoaderModelOnly"), Some("loras"));
        assert_eq!(category_hint("UNETLoader"), Some("diffusion_models"));
        assert_eq!(category_hint("KSampler"), None);
        // Exact, case-sensitive node type names
        assert_eq!(category_hint("vaeloader"), None);
    }

    #[test]
    fn test_is_model_filename() {
        assert!(is_model_filename("sdxl/base.safetensors"));
        assert!(is_model_filename("MODEL.CKPT"));
        assert!(is_model_filename("x.pt2"));
        assert!(!is_model_filename("foo.txt"));
        assert!(!is_model_filename("safetensors"));
        assert!(!is_model_filename(""));
    }

    #[test]
    fn test_is_model_field() {
        assert!(is_model_field("ckpt_name"));
        assert!(is_model_field("Upscale_Model"));
        assert!(is_model_field("ipadapter_file_name"));
        assert!(!is_model_field("seed"));
        assert!(!is_model_field("text"));
    }
}
