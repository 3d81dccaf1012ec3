//! Conventional defaults for optional training keys.

use serde_json::{Value, json};

/// Defaults for a LoRA fine-tune of the assistant model
///
/// Sectioned as `model`, `training`, `evaluation` and `dataset`. The base
/// model and dataset paths are left to the document.
#[must_use]
pub fn training_defaults() -> Value {
    json!({
        "model": {
            "max_seq_length": 2048,
            "lora": {
                "r": 16,
                "alpha": 32,
                "dropout": 0.05,
                "target_modules": ["q_proj", "k_proj", "v_proj", "o_proj"]
            }
        },
        "training": {
            "learning_rate": 2e-4,
            "num_epochs": 3,
            "batch_size": 4,
            "gradient_accumulation_steps": 4,
            "weight_decay": 0.0,
            "warmup_ratio": 0.03,
            "lr_scheduler": "cosine",
            "seed": 42,
            "bf16": true
        },
        "evaluation": {
            "eval_batch_size": 8,
            "strategy": "epoch"
        },
        "dataset": {
            "validation_split": 0.1,
            "shuffle": true
        }
    })
}
