use parspective_core::{CoreError, Machine};

/// The machine named by `spec` (a SpiNN-5 board when not given), with its
/// core resource called `core_resource`.
pub fn get_machine(spec: Option<&str>, core_resource: &str) -> Result<Machine, CoreError> {
    let machine = match spec {
        Some(spec) => Machine::from_spec(spec)?,
        None => Machine::spinn5(),
    };
    Ok(machine.with_core_resource(core_resource))
}
