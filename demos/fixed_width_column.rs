//! Labels in a fixed-width binary column.
//!
//! Stores that only offer `BINARY(N)` pad keys with NUL bytes. Labels never
//! contain NUL, so the padding is stripped losslessly on the way back.
//!
//! Run with: `cargo run --example fixed_width_column`

use preorder_label::{PreorderLabel, decode_column, encode_column, from_padded};

const WIDTH: usize = 4;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let root = PreorderLabel::root();
    let mut rows = root.create_children(4)?;
    let nested = rows[1].create_children(2)?;
    rows.extend(nested);
    rows.sort();

    let column = encode_column::<WIDTH>(&rows)?;
    tracing::info!(rows = rows.len(), bytes = column.len(), "encoded column");

    for row in column.chunks(WIDTH) {
        let label = from_padded(row)?;
        println!("{:02x?} -> {:<8} depth {}", row, label, label.depth());
    }

    let decoded = decode_column::<WIDTH>(&column)?;
    assert_eq!(decoded, rows);

    // A label that outgrew the column is rejected, not truncated.
    let deep = rows[0].create_child().create_child().create_child().create_child();
    match deep.to_padded::<WIDTH>() {
        Ok(_) => println!("{} fits", deep),
        Err(err) => println!("{}: {}", deep, err),
    }

    Ok(())
}
