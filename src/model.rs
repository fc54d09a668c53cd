// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - Model Pipelines

use serde::{Deserialize, Serialize};

use crate::ethereum::update_eth_price;
use crate::lbp::{policy_add_liquidity, policy_adjust_weight, policy_calc_pricing};
use crate::pipeline::{update_from_signal, Block, Pipeline};
use crate::stages::policy_upgrade_stages;

/// Pre-built pipelines selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    #[default]
    Lbp,
    NetworkUpgrade,
}

impl PipelineKind {
    pub fn build(self) -> Pipeline {
        match self {
            Self::Lbp => lbp_pipeline(),
            Self::NetworkUpgrade => network_upgrade_pipeline(),
        }
    }
}

fn ethereum_block() -> Block {
    Block::new("Environmental Ethereum processes: ETH price update")
        .variable("eth_price", update_eth_price)
}

fn stages_block() -> Block {
    Block::new("Update stages")
        .policy("policy_upgrade_stages", policy_upgrade_stages)
        .variable("stage", update_from_signal("stage"))
        .variable("timestamp", update_from_signal("timestamp"))
}

/// ETH price, stage, then the three LBP blocks (weight, supply, price).
pub fn lbp_pipeline() -> Pipeline {
    Pipeline::new()
        .block(ethereum_block())
        .block(stages_block())
        .block(
            Block::new("Adjust LBP weight")
                .policy("policy_adjust_weight", policy_adjust_weight)
                .variable("weight_x", update_from_signal("weight_x")),
        )
        .block(
            Block::new("Adjust LBP supply")
                .policy("policy_add_liquidity", policy_add_liquidity)
                .variable("lbp_supply_x", update_from_signal("lbp_supply_x"))
                .variable("lbp_supply_y", update_from_signal("lbp_supply_y")),
        )
        .block(
            Block::new("Calc LBP price")
                .policy("policy_calc_pricing", policy_calc_pricing)
                .variable("lbp_price_y_in_x", update_from_signal("lbp_price_y_in_x"))
                .variable("lbp_price_x_in_y", update_from_signal("lbp_price_x_in_y"))
                .variable("lbp_y_usd_price", update_from_signal("lbp_y_usd_price")),
        )
}

/// ETH price and stage only; meant for `StageMode::All` runs.
pub fn network_upgrade_pipeline() -> Pipeline {
    Pipeline::new().block(ethereum_block()).block(stages_block())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prebuilt_pipelines_are_valid() {
        assert!(lbp_pipeline().validate().is_ok());
        assert!(network_upgrade_pipeline().validate().is_ok());
    }

    #[test]
    fn lbp_blocks_run_in_dependency_order() {
        let pipeline = lbp_pipeline();
        let names: Vec<&str> = pipeline.blocks().iter().map(|b| b.description.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Environmental Ethereum processes: ETH price update",
                "Update stages",
                "Adjust LBP weight",
                "Adjust LBP supply",
                "Calc LBP price",
            ]
        );
        assert!(pipeline.blocks()[0].policies.is_empty());
    }

    #[test]
    fn kind_deserializes_from_snake_case() {
        let kind: PipelineKind = serde_json::from_str("\"network_upgrade\"").unwrap();
        assert_eq!(kind.build().len(), 2);
        assert_eq!(PipelineKind::default().build().len(), 5);
    }
}
