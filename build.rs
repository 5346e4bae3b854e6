use shadow_rs::ShadowBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Build metadata shown by `storefront-rs --version`
    ShadowBuilder::builder().build()?;
    Ok(())
}
