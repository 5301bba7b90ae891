use colored::Colorize;

pub fn handle() -> anyhow::Result<()> {
    let registry = super::registry()?;

    for prefix in registry.prefixes() {
        println!("{}", format!("{}:", prefix).bold());
        for service_type in registry
            .service_types()
            .into_iter()
            .filter(|t| t.prefix == prefix)
        {
            let info = registry.resolve_type(&service_type)?.info();
            let produces = info
                .produced_deploy_output_types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            println!(
                "  • {} (produces: {})",
                service_type.to_string().cyan(),
                if produces.is_empty() {
                    "-".to_string()
                } else {
                    produces.join(", ")
                }
            );
        }
    }
    Ok(())
}
