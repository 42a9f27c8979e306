use anyhow::Result;
use serde_json::json;
use tinychain_core::chain::Chain;
use tinychain_core::Block;

#[test]
fn transfer_scenario_end_to_end() -> Result<()> {
    let mut chain = Chain::with_difficulty(2);
    chain.append_block(Block::new(
        1,
        "t1",
        &json!({ "sender": "A", "recipient": "B", "quantity": 50 }),
        "",
    )?)?;
    chain.append_block(Block::new(
        2,
        "t2",
        &json!({ "sender": "A", "recipient": "C", "quantity": 10 }),
        "",
    )?)?;

    assert_eq!(chain.blocks.len(), 3);
    assert!(chain.blocks[1].hash.starts_with("00"));
    assert_eq!(chain.blocks[2].preceding_hash, chain.blocks[1].hash);
    assert!(chain.is_valid());
    Ok(())
}

#[test]
fn tampered_history_fails_full_check() -> Result<()> {
    let mut chain = Chain::with_difficulty(1);
    for (index, quantity) in [(1u64, 50u64), (2, 10), (3, 7)] {
        chain.append_block(Block::new(
            index,
            format!("t{index}"),
            &json!({ "sender": "A", "recipient": "B", "quantity": quantity }),
            "",
        )?)?;
    }
    assert!(chain.is_valid());

    // Rewriting history in the middle breaks every later link.
    chain.blocks[2].data = json!({ "sender": "A", "recipient": "M", "quantity": 9999 });
    assert!(!chain.is_valid());
    Ok(())
}
