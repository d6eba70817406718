mod exec;
mod ops;
mod restic;
