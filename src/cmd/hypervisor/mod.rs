//! `hypervisor` subverb: Xen images for dom0, domU and dom0less guests.
//!
//! The layout of the firmware directory (kernels, Xen binaries, device trees
//! and the imagebuilder scripts) is owned by the selected firmware; this
//! module only stages those artifacts, writes the imagebuilder
//! configuration and runs the scripts.

mod flow;
mod plan;

use anyhow::Result;
use clap::{ArgMatches, Args, Command, FromArgMatches};

use crate::cli::HypervisorArgs;
use crate::context::Context;
use crate::extension::{Extension, Registry};
use crate::firmware::DEFAULT_ROOTFS;
use crate::report;

pub use flow::{Deployment, XEN_CONFIG};
pub use plan::{Guest, XenPlan, check_counts, check_image_names};

pub struct HypervisorSubverb;

impl Extension for HypervisorSubverb {
    fn name(&self) -> &'static str {
        "hypervisor"
    }

    fn about(&self) -> &'static str {
        "Configure the Xen hypervisor"
    }

    fn command(&self, _registry: &Registry) -> Command {
        HypervisorArgs::augment_args(Command::new(self.name()).about(self.about()))
    }

    fn execute(&self, ctx: &Context<'_>, matches: &ArgMatches) -> Result<i32> {
        let args = HypervisorArgs::from_arg_matches(matches)?;
        run(ctx, &args)
    }
}

pub fn run(ctx: &Context<'_>, args: &HypervisorArgs) -> Result<i32> {
    let Some(dom0) = args.dom0 else {
        if args.domu.is_empty() && args.dom0less.is_empty() {
            report::fail("Please provide dom0 args at least");
        } else {
            report::fail("No dom0 specified, doing nothing.");
        }
        return Ok(0);
    };

    check_image_names(args)?;
    for warning in check_counts(args)? {
        report::warn(warning);
    }

    let plan = XenPlan::new(dom0, args);
    if plan.dom0_rootfs_defaulted {
        report::warn(format!(
            "No rootfs for Dom0 provided. Defaulting to {DEFAULT_ROOTFS}"
        ));
    }
    tracing::info!(
        dom0 = ?dom0,
        domus = plan.domus.len(),
        dom0less = plan.dom0less.len(),
        "deploying Xen image"
    );

    Deployment::new(ctx, args.debug).run(&plan)?;
    report::ok(format!(
        "Xen image ready at {} ({} guest(s) besides dom0)",
        ctx.firmware.raw_image().display(),
        plan.num_domus()
    ));
    Ok(0)
}
